//! Built-in Rhai functions for transforms.

use rhai::{Dynamic, Engine};
use std::net::IpAddr;

/// Registers all built-in functions in the Rhai engine.
pub fn register_builtin_functions(engine: &mut Engine) {
    register_uuid_functions(engine);
    register_time_functions(engine);
    register_parsing_functions(engine);
    register_string_functions(engine);
    register_ip_functions(engine);
}

fn register_uuid_functions(engine: &mut Engine) {
    // UUID v4 generation
    engine.register_fn("uuid", || uuid::Uuid::new_v4().to_string());
}

fn register_time_functions(engine: &mut Engine) {
    // Current timestamp in ISO 8601 format
    engine.register_fn("timestamp", || chrono::Utc::now().to_rfc3339());

    // Unix timestamp in seconds
    engine.register_fn("unix_timestamp", || chrono::Utc::now().timestamp());

    // Unix timestamp in milliseconds
    engine.register_fn("unix_timestamp_ms", || {
        chrono::Utc::now().timestamp_millis()
    });
}

fn register_parsing_functions(engine: &mut Engine) {
    // Parse string to integer
    engine.register_fn("parse_int", |s: &str| -> Dynamic {
        s.parse::<i64>().map(Dynamic::from).unwrap_or(Dynamic::UNIT)
    });

    // Parse string to float
    engine.register_fn("parse_float", |s: &str| -> Dynamic {
        s.parse::<f64>().map(Dynamic::from).unwrap_or(Dynamic::UNIT)
    });

    // Parse string to boolean
    engine.register_fn("parse_bool", |s: &str| -> Dynamic {
        match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Dynamic::from(true),
            "false" | "0" | "no" | "off" => Dynamic::from(false),
            _ => Dynamic::UNIT,
        }
    });
}

fn register_string_functions(engine: &mut Engine) {
    // Convert to lowercase
    engine.register_fn("to_lowercase", |s: &str| s.to_lowercase());

    // Convert to uppercase
    engine.register_fn("to_uppercase", |s: &str| s.to_uppercase());

    // Trim whitespace
    engine.register_fn("trim", |s: &str| s.trim().to_string());

    // Trim start
    engine.register_fn("trim_start", |s: &str| s.trim_start().to_string());

    // Trim end
    engine.register_fn("trim_end", |s: &str| s.trim_end().to_string());

    // String contains
    engine.register_fn("str_contains", |s: &str, pattern: &str| s.contains(pattern));

    // String starts with
    engine.register_fn("starts_with", |s: &str, prefix: &str| s.starts_with(prefix));

    // String ends with
    engine.register_fn("ends_with", |s: &str, suffix: &str| s.ends_with(suffix));

    // Replace substring
    engine.register_fn("replace", |s: &str, from: &str, to: &str| {
        s.replace(from, to)
    });

    // Split string into array
    engine.register_fn("split", |s: &str, delimiter: &str| -> rhai::Array {
        s.split(delimiter)
            .map(|part| Dynamic::from(part.to_string()))
            .collect()
    });

    // Join array into string
    engine.register_fn("join", |arr: rhai::Array, delimiter: &str| -> String {
        arr.iter()
            .filter_map(|v| v.clone().into_string().ok())
            .collect::<Vec<_>>()
            .join(delimiter)
    });

    // Substring extraction
    engine.register_fn("substring", |s: &str, start: i64, len: i64| -> String {
        let start = start.max(0) as usize;
        let len = len.max(0) as usize;
        s.chars().skip(start).take(len).collect()
    });
}

fn register_ip_functions(engine: &mut Engine) {
    // Check if IP is private/loopback
    engine.register_fn("is_private_ip", |ip: &str| -> bool {
        ip.parse::<IpAddr>()
            .map(|addr| match addr {
                IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
                IpAddr::V6(v6) => v6.is_loopback(),
            })
            .unwrap_or(false)
    });

    // Check if IP is valid
    engine.register_fn("is_valid_ip", |ip: &str| -> bool {
        ip.parse::<IpAddr>().is_ok()
    });

    // Check if IP is IPv4
    engine.register_fn("is_ipv4", |ip: &str| -> bool {
        ip.parse::<IpAddr>()
            .map(|addr| matches!(addr, IpAddr::V4(_)))
            .unwrap_or(false)
    });

    // Check if IP is IPv6
    engine.register_fn("is_ipv6", |ip: &str| -> bool {
        ip.parse::<IpAddr>()
            .map(|addr| matches!(addr, IpAddr::V6(_)))
            .unwrap_or(false)
    });

    // Normalize IP address (parse and re-format)
    engine.register_fn("normalize_ip", |ip: &str| -> Dynamic {
        ip.parse::<IpAddr>()
            .map(|addr| Dynamic::from(addr.to_string()))
            .unwrap_or(Dynamic::UNIT)
    });
}
