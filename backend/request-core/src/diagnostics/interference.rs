//! Best-effort detection of software that may intercept or rewrite requests.
//!
//! Heuristic and non-authoritative: a hit only means the operator should look.

use std::collections::BTreeSet;

use log::{debug, info, trace};
use serde::Serialize;
use sysinfo::{ProcessesToUpdate, System};

struct SecuritySuite {
    name: &'static str,
    /// Process stems (lower-case, no `.exe`) matched exactly.
    processes: &'static [&'static str],
    /// Vendor names matched anywhere in the process name.
    vendor: Option<&'static str>,
}

const SECURITY_SUITES: &[SecuritySuite] = &[
    SecuritySuite {
        name: "Kaspersky Security Suite",
        processes: &["avp", "avpui", "klnagent"],
        vendor: Some("kaspersky"),
    },
    SecuritySuite {
        name: "ESET Security",
        processes: &["ekrn", "egui", "eguiproxy"],
        vendor: None,
    },
    SecuritySuite {
        name: "Avast/AVG Antivirus",
        processes: &["avastsvc", "avastui", "avgsvc", "avgui"],
        vendor: Some("avast"),
    },
    SecuritySuite {
        name: "McAfee",
        processes: &["mcshield", "mfemms", "mfevtps"],
        vendor: Some("mcafee"),
    },
    SecuritySuite {
        name: "Norton Security",
        processes: &["nortonsecurity", "nsservice"],
        vendor: Some("norton"),
    },
    SecuritySuite {
        name: "Webroot SecureAnywhere",
        processes: &["wrsa"],
        vendor: Some("webroot"),
    },
];

const PROXY_ENV_VARS: &[&str] = &[
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "ALL_PROXY",
    "http_proxy",
    "https_proxy",
    "all_proxy",
];

const PROXY_FINDING: &str = "HTTP proxy or VPN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterferenceReport {
    pub detected: bool,
    pub names: Vec<String>,
}

/// Scan running processes and proxy environment variables.
pub fn check_for_interfering_software() -> InterferenceReport {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);
    trace!("Scanning {} processes for security software", sys.processes().len());

    let names: Vec<String> = sys
        .processes()
        .values()
        .map(|p| p.name().to_string_lossy().to_string())
        .collect();

    let report = classify_interference(names.iter().map(String::as_str), |var| {
        std::env::var(var).ok()
    });

    if report.detected {
        info!("Potentially interfering software: {}", report.names.join(", "));
    } else {
        debug!("No interfering software detected");
    }
    report
}

/// Pure classification over process names and an environment lookup.
pub fn classify_interference<'a, I, F>(process_names: I, env_lookup: F) -> InterferenceReport
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> Option<String>,
{
    let mut found = BTreeSet::new();

    for process in process_names {
        let lowered = process.to_ascii_lowercase();
        let stem = lowered.strip_suffix(".exe").unwrap_or(&lowered);

        for suite in SECURITY_SUITES {
            let by_process = suite.processes.contains(&stem);
            let by_vendor = suite.vendor.is_some_and(|vendor| stem.contains(vendor));
            if by_process || by_vendor {
                found.insert(suite.name.to_string());
            }
        }
    }

    let proxy_var = PROXY_ENV_VARS
        .iter()
        .find(|var| env_lookup(var).is_some_and(|value| !value.trim().is_empty()));
    if let Some(var) = proxy_var {
        found.insert(format!("{} ({})", PROXY_FINDING, var));
    }

    let names: Vec<String> = found.into_iter().collect();
    InterferenceReport {
        detected: !names.is_empty(),
        names,
    }
}
