use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::error::WatchError;

/// Selector used when neither `ELEMENT_SELECTOR` nor `ELEMENT_ID` is set.
pub const DEFAULT_ELEMENT_SELECTOR: &str = "button#subscription-submit";

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Page to poll (`TARGET_URL`, falling back to `PARKING_URL`)
    pub target_url: String,

    /// CSS selector of the element whose presence signals availability
    pub element_selector: String,

    /// Poll cadence in seconds for interval scheduling (default: 3600)
    pub check_interval_secs: u64,

    /// Fixed check times. Non-empty switches the watcher to fixed-times scheduling.
    pub check_times: Vec<NaiveTime>,

    /// Time of day after which the daily summary is sent (default: 21:00)
    pub summary_time: NaiveTime,

    /// Delay after a failed tick, in seconds (default: 300)
    pub error_cooldown_secs: u64,

    /// Timeout for the page fetch and for notification delivery (default: 30)
    pub request_timeout_secs: u64,

    /// Explicit zone for day boundaries; host local time when unset
    pub timezone: Option<Tz>,

    /// Human name of the watched resource, used in messages
    pub resource_name: String,

    /// Send a notification when the watcher starts (default: true)
    pub startup_notification: bool,

    /// Report quiet fixed-time checks as well (default: false)
    pub report_quiet_checks: bool,

    /// Where notifications go
    pub channel: ChannelConfig,
}

/// Outbound notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelConfig {
    Webhook { url: String },
    Email(SmtpConfig),
}

/// Authenticated SMTP submission settings (STARTTLS).
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
    pub recipient: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, WatchError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let target_url = get("TARGET_URL")
            .or_else(|| get("PARKING_URL"))
            .ok_or_else(|| WatchError::Config("TARGET_URL or PARKING_URL is required".into()))?;

        let element_selector = match (get("ELEMENT_SELECTOR"), get("ELEMENT_ID")) {
            (Some(selector), _) => selector,
            (None, Some(id)) => format!("#{id}"),
            (None, None) => DEFAULT_ELEMENT_SELECTOR.to_string(),
        };

        let check_interval_secs = parse_u64(get("CHECK_INTERVAL"), "CHECK_INTERVAL", 3600)?;
        if check_interval_secs == 0 {
            return Err(WatchError::Config("CHECK_INTERVAL must be greater than 0".into()));
        }

        let check_times = match get("CHECK_TIMES") {
            Some(raw) => parse_time_list(&raw)?,
            None => Vec::new(),
        };

        let summary_time = match get("SUMMARY_TIME") {
            Some(raw) => parse_time(&raw, "SUMMARY_TIME")?,
            None => NaiveTime::from_hms_opt(21, 0, 0)
                .ok_or_else(|| WatchError::Config("invalid default SUMMARY_TIME".into()))?,
        };

        let timezone = match get("TIMEZONE") {
            Some(raw) => Some(raw.parse::<Tz>().map_err(|e| {
                WatchError::Config(format!("TIMEZONE '{raw}' is not a known zone: {e}"))
            })?),
            None => None,
        };

        Ok(Self {
            target_url,
            element_selector,
            check_interval_secs,
            check_times,
            summary_time,
            error_cooldown_secs: parse_u64(get("ERROR_COOLDOWN"), "ERROR_COOLDOWN", 300)?,
            request_timeout_secs: parse_u64(get("REQUEST_TIMEOUT"), "REQUEST_TIMEOUT", 30)?,
            timezone,
            resource_name: get("RESOURCE_NAME").unwrap_or_else(|| "parking subscription".into()),
            startup_notification: parse_bool(get("STARTUP_NOTIFICATION"), "STARTUP_NOTIFICATION", true)?,
            report_quiet_checks: parse_bool(get("REPORT_QUIET_CHECKS"), "REPORT_QUIET_CHECKS", false)?,
            channel: ChannelConfig::from_lookup(&get)?,
        })
    }

    /// Whether checks run at fixed times of day rather than on an interval.
    pub fn uses_fixed_times(&self) -> bool {
        !self.check_times.is_empty()
    }
}

impl ChannelConfig {
    fn from_lookup<F>(get: &F) -> Result<Self, WatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_url = get("WEBHOOK_URL").or_else(|| get("MAKE_WEBHOOK_URL"));

        let channel = match get("NOTIFY_CHANNEL").map(|c| c.to_ascii_lowercase()) {
            Some(c) if c == "webhook" => "webhook",
            Some(c) if c == "email" => "email",
            Some(other) => {
                return Err(WatchError::Config(format!(
                    "NOTIFY_CHANNEL must be 'webhook' or 'email', got '{other}'"
                )));
            }
            None if webhook_url.is_some() => "webhook",
            None if get("SMTP_SERVER").is_some() => "email",
            None => {
                return Err(WatchError::Config(
                    "WEBHOOK_URL (or MAKE_WEBHOOK_URL) or SMTP_SERVER is required".into(),
                ));
            }
        };

        if channel == "webhook" {
            let url = webhook_url.ok_or_else(|| {
                WatchError::Config("WEBHOOK_URL or MAKE_WEBHOOK_URL is required".into())
            })?;
            return Ok(ChannelConfig::Webhook { url });
        }

        let required = |key: &str| {
            get(key).ok_or_else(|| {
                WatchError::Config(format!("{key} environment variable is required"))
            })
        };

        let port = get("SMTP_PORT")
            .unwrap_or_else(|| "587".to_string())
            .parse()
            .map_err(|_| WatchError::Config("SMTP_PORT must be a valid u16".into()))?;

        Ok(ChannelConfig::Email(SmtpConfig {
            server: required("SMTP_SERVER")?,
            port,
            sender: required("SENDER_EMAIL")?,
            password: required("SENDER_PASSWORD")?,
            recipient: required("RECIPIENT_EMAIL")?,
        }))
    }
}

fn parse_u64(raw: Option<String>, key: &str, default: u64) -> Result<u64, WatchError> {
    match raw {
        Some(v) => v
            .parse()
            .map_err(|_| WatchError::Config(format!("{key} must be a valid u64"))),
        None => Ok(default),
    }
}

fn parse_bool(raw: Option<String>, key: &str, default: bool) -> Result<bool, WatchError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(WatchError::Config(format!("{key} must be a boolean"))),
    }
}

fn parse_time(raw: &str, key: &str) -> Result<NaiveTime, WatchError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| WatchError::Config(format!("{key} must look like HH:MM, got '{raw}'")))
}

/// Parse a comma-separated list of times, returned sorted and deduplicated.
fn parse_time_list(raw: &str) -> Result<Vec<NaiveTime>, WatchError> {
    let mut times = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_time(s, "CHECK_TIMES"))
        .collect::<Result<Vec<_>, _>>()?;
    times.sort();
    times.dedup();
    Ok(times)
}
