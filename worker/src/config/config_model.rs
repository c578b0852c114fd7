#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub twilio: Twilio,
    pub dispatch: Dispatch,
    pub internal_api: InternalApi,
    pub scheduler: Scheduler,
    pub analytics: Analytics,
    pub stage: String,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Twilio {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_base_url: String,
    pub status_callback_url: Option<String>,
    pub validate_signatures: bool,
    /// Public origin Twilio calls, used to rebuild the signed URL behind a proxy.
    pub webhook_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Dispatch {
    pub max_concurrency: usize,
    /// `None` leaves sends unpaced.
    pub sends_per_second: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct InternalApi {
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    pub loop_enabled: bool,
    pub interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Analytics {
    pub reconcile_min_interval_secs: i64,
}
