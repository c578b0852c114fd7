pub mod default_routers;
pub mod http_serve;
pub mod responses;
pub mod routers;
