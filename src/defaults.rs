//! Values the operator starts out with when nothing else is given.

use std::env;
use std::fs;

use tracing::debug;


const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";
const FALLBACK_SERVER_ADDRESS: &str = "localhost";


/// The DNS domain of the local machine.
pub fn default_server_address() -> String {
    if let Some(domain) = non_empty_var("USERDNSDOMAIN") {
        return domain;
    }
    match fs::read_to_string(RESOLV_CONF_PATH) {
        Ok(contents) => {
            if let Some(domain) = resolv_conf_domain(&contents) {
                return domain.to_owned();
            }
        },
        Err(e) => debug!(path = RESOLV_CONF_PATH, error = %e, "cannot read resolver configuration"),
    }
    FALLBACK_SERVER_ADDRESS.to_owned()
}

/// `DOMAIN\user`, or just `user` if the machine is not in a domain.
pub fn default_username() -> String {
    qualify_username(non_empty_var("USERDOMAIN").as_deref(), &current_user())
}

pub fn default_filter() -> String {
    format!("samAccountName={}", current_user())
}


fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
}

fn current_user() -> String {
    ["USERNAME", "USER", "LOGNAME"].into_iter()
        .find_map(non_empty_var)
        .unwrap_or_default()
}

fn qualify_username(domain: Option<&str>, user: &str) -> String {
    match domain {
        Some(domain) => format!("{}\\{}", domain, user),
        None => user.to_owned(),
    }
}

/// The domain named by a resolver configuration; `domain` wins over the first `search` entry.
fn resolv_conf_domain(contents: &str) -> Option<&str> {
    let mut search_domain = None;
    for line in contents.lines() {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("domain") => {
                if let Some(domain) = words.next() {
                    return Some(domain.trim_end_matches('.'));
                }
            },
            Some("search") => {
                if search_domain.is_none() {
                    search_domain = words.next().map(|d| d.trim_end_matches('.'));
                }
            },
            _ => {},
        }
    }
    search_domain
}
