pub fn default_port() -> u16 {
    8000
}

pub fn default_db_host() -> String {
    "localhost".to_string()
}

pub fn default_db_port() -> u16 {
    5432
}

pub fn default_db_username() -> String {
    "postgres".to_string()
}

pub fn default_db_name() -> String {
    "postgres".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_query_max_limit() -> u32 {
    100
}

pub fn default_access_token_ttl_seconds() -> u64 {
    900
}

pub fn default_refresh_token_ttl_seconds() -> u64 {
    604_800
}
