pub mod carriers;
pub mod db;
pub mod storages;
