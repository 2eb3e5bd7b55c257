//! Human-readable deployment output.

use std::fmt::Write;

use crowd_utils::format_elapsed;

use crate::framework::{AddressMap, DeploymentReport};

/// Two-column name/address table.
pub fn format_table(addresses: &AddressMap) -> String {
    let width = addresses
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("Contract".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  Address", "Contract");
    let _ = writeln!(out, "{:-<width$}  {:-<42}", "", "");
    for (name, address) in addresses {
        let _ = writeln!(out, "{name:<width$}  {address:?}");
    }
    out
}

/// Table plus a one-line summary with the elapsed time.
pub fn format_summary(report: &DeploymentReport) -> String {
    let mut out = format_table(&report.addresses);
    let _ = writeln!(
        out,
        "\nDeployed {} contracts ({} already present) in {}",
        report.deployed.len(),
        report.skipped.len(),
        format_elapsed(report.elapsed)
    );
    out
}
