//! The fixed battery of site probes.
//!
//! Every probe is a `(name, classifier)` pair. Classifiers are plain
//! functions so each one can be tested without a network; the few that
//! need a second request describe the path and let [`Probe::run`] issue it.

use crate::core::{FetchOutcome, Fetcher, ProbeValue, Target};
use crate::utils::error::{ProbeError, Result};
use std::collections::HashSet;

pub const PAYMENT_GATEWAYS: &str = "payment_gateways";
pub const BOT_CHALLENGE: &str = "bot_challenge";
pub const EDGE_NETWORK: &str = "edge_network";
pub const API_BACKEND: &str = "api_backend";
pub const PROTECTED_PATH: &str = "protected_path";
pub const PLATFORM: &str = "platform";
pub const DIAGNOSTIC_LEAK: &str = "diagnostic_leak";
pub const STATUS_CODE: &str = "status_code";

pub const NO_GATEWAY_FOUND: &str = "No recognized payment gateway found";
pub const NONE_LABEL: &str = "None";
pub const ERROR_LABEL: &str = "Error";
pub const REACHABLE_LABEL: &str = "Reachable";
pub const DIAGNOSTICS_FOUND_LABEL: &str = "Error logs found";

pub const GRAPHQL_PATH: &str = "graphql";
pub const PROTECTED_ACCOUNT_PATH: &str = "my-account/add-payment-method/";

/// 大小寫敏感
const CHALLENGE_MARKERS: &[&str] = &[
    "https://www.google.com/recaptcha/api",
    "www.google.com/recaptcha",
    "verifyRecaptchaToken",
    "grecaptcha",
];

/// 轉小寫後比對
const CHALLENGE_MARKERS_CI: &[&str] = &["captcha"];

/// Priority order of the gateway report. Markers are case-sensitive.
const GATEWAY_MARKERS: &[(&str, &[&str])] = &[
    ("Stripe", &["stripe"]),
    ("Cybersource", &["Cybersource"]),
    ("Paypal", &["paypal"]),
    ("Authorize.net", &["authorize.net"]),
    ("Bluepay", &["Bluepay"]),
    ("Magento", &["Magento"]),
    ("WooCommerce", &["woo"]),
    ("Shopify", &["Shopify"]),
    ("Adyen", &["adyen", "Adyen"]),
    ("Braintree", &["braintree"]),
    ("Square", &["square"]),
    ("Payflow", &["payflow"]),
];

const EDGE_NETWORK_MARKER: &str = "cloudflare";

const PLATFORM_MARKERS: &[(&str, &str)] = &[("wordpress", "WordPress"), ("shopify", "Shopify")];

const DIAGNOSTIC_MARKERS: &[&str] = &["error", "exception"];

pub fn detect_bot_challenge(body: &str) -> bool {
    if CHALLENGE_MARKERS.iter().any(|marker| body.contains(marker)) {
        return true;
    }
    let lower = body.to_lowercase();
    CHALLENGE_MARKERS_CI.iter().any(|marker| lower.contains(marker))
}

pub fn detect_payment_gateways(body: &str) -> Vec<&'static str> {
    GATEWAY_MARKERS
        .iter()
        .filter(|(_, markers)| markers.iter().any(|marker| body.contains(marker)))
        .map(|(name, _)| *name)
        .collect()
}

pub fn detect_edge_network(body: &str) -> bool {
    body.to_lowercase().contains(EDGE_NETWORK_MARKER)
}

pub fn has_api_query_markers(body: &str) -> bool {
    body.to_lowercase().contains("graphql") || body.contains("query {") || body.contains("mutation {")
}

pub fn detect_platform(body: &str) -> Option<&'static str> {
    let lower = body.to_lowercase();
    PLATFORM_MARKERS
        .iter()
        .find(|(marker, _)| lower.contains(marker))
        .map(|(_, name)| *name)
}

pub fn detect_diagnostic_leak(body: &str) -> bool {
    let lower = body.to_lowercase();
    DIAGNOSTIC_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn classify_payment_gateways(body: &str) -> ProbeValue {
    let found = detect_payment_gateways(body);
    if found.is_empty() {
        ProbeValue::label(NO_GATEWAY_FOUND)
    } else {
        ProbeValue::Matches(found.into_iter().map(String::from).collect())
    }
}

fn classify_bot_challenge(body: &str) -> ProbeValue {
    ProbeValue::Flag(detect_bot_challenge(body))
}

fn classify_edge_network(body: &str) -> ProbeValue {
    ProbeValue::Flag(detect_edge_network(body))
}

fn classify_platform(body: &str) -> ProbeValue {
    ProbeValue::label(detect_platform(body).unwrap_or(NONE_LABEL))
}

fn classify_diagnostic_leak(body: &str) -> ProbeValue {
    if detect_diagnostic_leak(body) {
        ProbeValue::label(DIAGNOSTICS_FOUND_LABEL)
    } else {
        ProbeValue::label(NONE_LABEL)
    }
}

fn flag_verdict(hit: bool) -> ProbeValue {
    ProbeValue::Flag(hit)
}

fn reachable_verdict(hit: bool) -> ProbeValue {
    if hit {
        ProbeValue::label(REACHABLE_LABEL)
    } else {
        ProbeValue::label(NONE_LABEL)
    }
}

fn no_gateway() -> ProbeValue {
    ProbeValue::label(NO_GATEWAY_FOUND)
}

fn flag_off() -> ProbeValue {
    ProbeValue::Flag(false)
}

fn none_label() -> ProbeValue {
    ProbeValue::label(NONE_LABEL)
}

fn error_label() -> ProbeValue {
    ProbeValue::label(ERROR_LABEL)
}

#[derive(Clone, Copy)]
pub enum Classifier {
    /// Scans the primary response body.
    Body(fn(&str) -> ProbeValue),
    /// Reports the primary response status code.
    Status,
    /// Issues its own GET to `{target}/{path}` and treats HTTP 200 as a hit.
    /// When `body_hint` matches the primary body the extra request is skipped.
    Followup {
        path: &'static str,
        body_hint: Option<fn(&str) -> bool>,
        verdict: fn(bool) -> ProbeValue,
    },
}

#[derive(Clone, Copy)]
pub struct Probe {
    pub name: &'static str,
    pub label: &'static str,
    pub classifier: Classifier,
    /// 無法完成時填入報告的值
    pub fallback: fn() -> ProbeValue,
}

impl std::fmt::Debug for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish()
    }
}

impl Probe {
    pub fn fallback_value(&self) -> ProbeValue {
        (self.fallback)()
    }

    /// Runs the probe against an already-fetched primary response.
    pub async fn run<F: Fetcher + ?Sized>(
        &self,
        target: &Target,
        primary: &FetchOutcome,
        fetcher: &F,
    ) -> Result<ProbeValue> {
        match self.classifier {
            Classifier::Body(classify) => Ok(classify(&primary_page(primary)?.body)),
            Classifier::Status => Ok(ProbeValue::StatusCode(primary_page(primary)?.status_code)),
            Classifier::Followup {
                path,
                body_hint,
                verdict,
            } => {
                if let Some(hint) = body_hint {
                    if hint(&primary_page(primary)?.body) {
                        return Ok(verdict(true));
                    }
                }

                let url = target.join_path(path);
                match fetcher.fetch(&url).await {
                    FetchOutcome::Failure { reason } => Err(ProbeError::Network { url, reason }),
                    reached => Ok(verdict(reached.is_ok_status())),
                }
            }
        }
    }
}

fn primary_page(primary: &FetchOutcome) -> Result<&crate::core::FetchedPage> {
    match primary {
        FetchOutcome::Success(page) => Ok(page),
        FetchOutcome::Failure { reason } => Err(ProbeError::PrimaryUnavailable {
            reason: reason.clone(),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct ProbeSet {
    probes: Vec<Probe>,
}

impl ProbeSet {
    /// Builds a custom set. Names must be unique so reports stay keyed.
    pub fn new(probes: Vec<Probe>) -> Result<Self> {
        if probes.is_empty() {
            return Err(ProbeError::ConfigError {
                message: "probe set cannot be empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for probe in &probes {
            if !seen.insert(probe.name) {
                return Err(ProbeError::ConfigError {
                    message: format!("duplicate probe name: {}", probe.name),
                });
            }
        }

        Ok(Self { probes })
    }

    pub fn standard() -> Self {
        Self {
            probes: vec![
                Probe {
                    name: PAYMENT_GATEWAYS,
                    label: "Payment Gateways",
                    classifier: Classifier::Body(classify_payment_gateways),
                    fallback: no_gateway,
                },
                Probe {
                    name: BOT_CHALLENGE,
                    label: "Bot Challenge",
                    classifier: Classifier::Body(classify_bot_challenge),
                    fallback: flag_off,
                },
                Probe {
                    name: EDGE_NETWORK,
                    label: "Edge Network",
                    classifier: Classifier::Body(classify_edge_network),
                    fallback: flag_off,
                },
                Probe {
                    name: API_BACKEND,
                    label: "GraphQL",
                    classifier: Classifier::Followup {
                        path: GRAPHQL_PATH,
                        body_hint: Some(has_api_query_markers),
                        verdict: flag_verdict,
                    },
                    fallback: flag_off,
                },
                Probe {
                    name: PROTECTED_PATH,
                    label: "Protected Path",
                    classifier: Classifier::Followup {
                        path: PROTECTED_ACCOUNT_PATH,
                        body_hint: None,
                        verdict: reachable_verdict,
                    },
                    fallback: none_label,
                },
                Probe {
                    name: PLATFORM,
                    label: "Platform",
                    classifier: Classifier::Body(classify_platform),
                    fallback: none_label,
                },
                Probe {
                    name: DIAGNOSTIC_LEAK,
                    label: "Diagnostic Leak",
                    classifier: Classifier::Body(classify_diagnostic_leak),
                    fallback: none_label,
                },
                Probe {
                    name: STATUS_CODE,
                    label: "Status",
                    classifier: Classifier::Status,
                    fallback: error_label,
                },
            ],
        }
    }

    pub fn without(mut self, name: &str) -> Self {
        self.probes.retain(|probe| probe.name != name);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Probe> {
        self.probes.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Probe> {
        self.probes.iter().find(|probe| probe.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|probe| probe.name).collect()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

impl Default for ProbeSet {
    fn default() -> Self {
        Self::standard()
    }
}
