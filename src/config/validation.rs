use crate::config::types::{
    Config, HarvestConfig, LookupConfig, OutputConfig, RetryConfig, SourceConfig, UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvest_config(&config.harvest)?;
    validate_retry_config(&config.retry)?;
    validate_lookup_config(&config.lookup)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates scroll-harvest configuration
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.scroll_step < 1 {
        return Err(ConfigError::Validation(format!(
            "scroll_step must be >= 1, got {}",
            config.scroll_step
        )));
    }

    if config.stagnant_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "stagnant_threshold must be >= 1, got {}",
            config.stagnant_threshold
        )));
    }

    if config.max_scroll_rounds < 1 {
        return Err(ConfigError::Validation(format!(
            "max_scroll_rounds must be >= 1, got {}",
            config.max_scroll_rounds
        )));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be between 0 and 10, got {}",
            config.max_retries
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "retry min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates lookup site configuration
fn validate_lookup_config(config: &LookupConfig) -> Result<(), ConfigError> {
    Url::parse(&config.search_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search_url: {}", e)))?;

    if config.workers < 1 || config.workers > 8 {
        return Err(ConfigError::Validation(format!(
            "lookup workers must be between 1 and 8, got {}",
            config.workers
        )));
    }

    if config.min_interval_ms > config.max_interval_ms {
        return Err(ConfigError::Validation(format!(
            "lookup min_interval_ms ({}) must not exceed max_interval_ms ({})",
            config.min_interval_ms, config.max_interval_ms
        )));
    }

    if config.no_results_text.trim().is_empty() {
        return Err(ConfigError::Validation(
            "no_results_text cannot be empty".to_string(),
        ));
    }

    for selector in [
        &config.query_input,
        &config.result_row,
        &config.detail_row,
        &config.heading_cell,
        &config.value_cell,
    ] {
        validate_selector(selector)?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.file_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "file_prefix cannot be empty".to_string(),
        ));
    }

    if config
        .file_prefix
        .chars()
        .any(|c| c == '/' || c == '\\')
    {
        return Err(ConfigError::Validation(format!(
            "file_prefix must not contain path separators, got '{}'",
            config.file_prefix
        )));
    }

    if matches!(&config.database_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "database_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates listing sources
fn validate_sources(sources: &[SourceConfig]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] must be configured".to_string(),
        ));
    }

    for source in sources {
        let url = Url::parse(&source.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid source URL '{}': {}", source.url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Source URL '{}' must use HTTP or HTTPS",
                source.url
            )));
        }

        validate_selector(&source.root_selector)?;
        validate_selector(&source.date_selector)?;
        validate_selector(&source.name_selector)?;

        for selector in [
            &source.card_selector,
            &source.age_selector,
            &source.location_selector,
        ]
        .into_iter()
        .flatten()
        {
            validate_selector(selector)?;
        }

        for selector in &source.dismiss_selectors {
            validate_selector(selector)?;
        }

        if (source.age_selector.is_some() || source.location_selector.is_some())
            && source.card_selector.is_none()
        {
            return Err(ConfigError::Validation(format!(
                "Source '{}' sets age/location selectors without a card_selector",
                source.url
            )));
        }
    }

    Ok(())
}

/// Validates that a string parses as a CSS selector
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::InvalidSelector(
            "Selector cannot be empty".to_string(),
        ));
    }

    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid contact_email '{}': missing @",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid contact_email '{}'",
            email
        )));
    }

    Ok(())
}
