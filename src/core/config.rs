use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: String,
    /// Moltiplicatore applicato alle latenze simulate, 0 le disattiva
    pub latency_scale: f64,
    /// Ritardo della transizione automatica sent -> delivered, `None` la disattiva
    pub delivery_delay: Option<Duration>,
    pub reply_probability: f64,
    pub reply_delay_min: Duration,
    pub reply_delay_max: Duration,
    pub typing_probability: f64,
    pub typing_duration: Duration,
    pub online_window: Duration,
    pub current_user_id: String,
    pub event_channel_capacity: usize,
    pub seed_dir: Option<PathBuf>,
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_env: "development".to_string(),
            latency_scale: 1.0,
            delivery_delay: Some(Duration::from_millis(1000)),
            reply_probability: 0.5,
            reply_delay_min: Duration::from_millis(2000),
            reply_delay_max: Duration::from_millis(5000),
            typing_probability: 0.3,
            typing_duration: Duration::from_millis(3000),
            online_window: Duration::from_secs(5 * 60),
            current_user_id: "1".to_string(),
            event_channel_capacity: 256,
            seed_dir: None,
            rng_seed: None,
        }
    }
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();
        let defaults = Self::default();

        let app_env = env::var("APP_ENV").unwrap_or(defaults.app_env);

        let latency_scale = parse_var("LATENCY_SCALE", defaults.latency_scale)?;
        if latency_scale < 0.0 || !latency_scale.is_finite() {
            return Err("Invalid LATENCY_SCALE: must be a non-negative number".to_string());
        }

        let delivery_ms: u64 = parse_var("DELIVERY_DELAY_MS", 1000)?;
        let delivery_delay = (delivery_ms > 0).then(|| Duration::from_millis(delivery_ms));

        let reply_probability = parse_probability("REPLY_PROBABILITY", defaults.reply_probability)?;
        let reply_delay_min = Duration::from_millis(parse_var("REPLY_DELAY_MIN_MS", 2000)?);
        let reply_delay_max = Duration::from_millis(parse_var("REPLY_DELAY_MAX_MS", 5000)?);
        if reply_delay_min > reply_delay_max {
            return Err(
                "Invalid REPLY_DELAY_MIN_MS: must not exceed REPLY_DELAY_MAX_MS".to_string(),
            );
        }

        let typing_probability =
            parse_probability("TYPING_PROBABILITY", defaults.typing_probability)?;
        let typing_duration = Duration::from_millis(parse_var("TYPING_DURATION_MS", 3000)?);
        let online_window = Duration::from_secs(parse_var("ONLINE_WINDOW_SECS", 300)?);

        let current_user_id = env::var("CURRENT_USER_ID").unwrap_or(defaults.current_user_id);

        let event_channel_capacity: usize = parse_var("EVENT_CHANNEL_CAPACITY", 256)?;
        if event_channel_capacity == 0 {
            return Err("Invalid EVENT_CHANNEL_CAPACITY: must be a positive number".to_string());
        }

        let seed_dir = env::var("SEED_DIR").ok().map(PathBuf::from);

        let rng_seed = match env::var("RNG_SEED") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|_| "Invalid RNG_SEED: must be a positive number".to_string())?,
            ),
            Err(_) => None,
        };

        Ok(Config {
            app_env,
            latency_scale,
            delivery_delay,
            reply_probability,
            reply_delay_min,
            reply_delay_max,
            typing_probability,
            typing_duration,
            online_window,
            current_user_id,
            event_channel_capacity,
            seed_dir,
            rng_seed,
        })
    }

    /// Configurazione per i test: nessuna latenza, nessuna simulazione casuale
    pub fn for_tests() -> Self {
        Self {
            app_env: "test".to_string(),
            latency_scale: 0.0,
            reply_probability: 0.0,
            typing_probability: 0.0,
            rng_seed: Some(7),
            ..Self::default()
        }
    }

    /// Logga la configurazione effettiva
    pub fn print_info(&self) {
        info!("Chat core configuration:");
        info!("   Environment: {}", self.app_env);
        info!("   Latency scale: {}", self.latency_scale);
        match self.delivery_delay {
            Some(delay) => info!("   Auto delivery after: {}ms", delay.as_millis()),
            None => info!("   Auto delivery: disabled"),
        }
        info!(
            "   Simulated replies: p={} in {}-{}ms",
            self.reply_probability,
            self.reply_delay_min.as_millis(),
            self.reply_delay_max.as_millis()
        );
        info!("   Current user: {}", self.current_user_id);
        match &self.seed_dir {
            Some(dir) => info!("   Seed directory: {}", dir.display()),
            None => info!("   Seed: bundled fixtures"),
        }
        if self.latency_scale == 0.0 && self.app_env != "test" {
            warn!("Latency simulation disabled outside of tests");
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("Invalid {name}: must be a number")),
        Err(_) => Ok(default),
    }
}

fn parse_probability(name: &str, default: f64) -> Result<f64, String> {
    let value: f64 = parse_var(name, default)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("Invalid {name}: must be between 0 and 1"));
    }
    Ok(value)
}
