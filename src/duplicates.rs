//! Duplicate scan results and their conversion into hardlinks.

use crate::api::{ConvertGroup, ConvertRequest, ConvertResponse, LinkApi};
use crate::confirm::{ConfirmationGate, Decision};
use crate::error::{ClientError, Result};
use crate::job_monitor::DuplicateGroup;
use tracing::{error, info, warn};

/// Total bytes reclaimable across `groups`
pub fn potential_savings(groups: &[DuplicateGroup]) -> u64 {
    groups.iter().map(DuplicateGroup::wasted_bytes).sum()
}

/// Human-readable size with binary units
pub fn human_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < UNITS.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}", bytes as f64 / div as f64, UNITS[exp])
}

impl ConvertRequest {
    /// Groups without duplicates are left out; the server would skip them anyway
    pub fn from_groups(groups: &[DuplicateGroup]) -> Self {
        Self {
            groups: groups
                .iter()
                .filter(|group| !group.master.is_empty() && !group.others.is_empty())
                .map(|group| ConvertGroup {
                    master: group.master.clone(),
                    others: group.others.clone(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// How a conversion turned out, as reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionVerdict {
    Converted,
    /// Some links created, some errors reported
    Partial,
    /// Server accepted the request but created nothing
    NothingCreated,
}

impl ConvertResponse {
    pub fn verdict(&self) -> ConversionVerdict {
        if self.created == 0 {
            ConversionVerdict::NothingCreated
        } else if self.errors.is_empty() {
            ConversionVerdict::Converted
        } else {
            ConversionVerdict::Partial
        }
    }
}

/// Ask once for the whole batch, then convert every selected group.
///
/// Returns `Ok(None)` when declined or nothing was selected.
pub async fn convert_duplicates<L, G>(
    api: &L,
    gate: &mut G,
    groups: &[DuplicateGroup],
) -> Result<Option<ConvertResponse>>
where
    L: LinkApi,
    G: ConfirmationGate,
{
    let request = ConvertRequest::from_groups(groups);
    if request.is_empty() {
        warn!(component = "duplicates", "No duplicate groups selected");
        return Ok(None);
    }

    let message = format!(
        "Convert {} duplicate groups into hardlinks?\nPotential space saved: {}",
        request.groups.len(),
        human_size(potential_savings(groups))
    );
    if gate
        .confirm("Warning: irreversible operation", &message)
        .await
        == Decision::Decline
    {
        info!(component = "duplicates", "Conversion declined");
        return Ok(None);
    }

    info!(component = "duplicates", groups = request.groups.len(), "Converting duplicates");
    let response = api.convert(&request).await?;
    if !response.ok {
        let reason = response.error.clone().unwrap_or_else(|| "Conversion failed".to_string());
        error!(component = "duplicates", error = %reason, "Conversion rejected");
        return Err(ClientError::Other(reason));
    }

    match response.verdict() {
        ConversionVerdict::Converted => info!(
            component = "duplicates",
            created = response.created,
            saved = %human_size(response.bytes_saved),
            "Duplicates converted"
        ),
        ConversionVerdict::Partial => warn!(
            component = "duplicates",
            created = response.created,
            errors = response.errors.len(),
            "Partial conversion"
        ),
        ConversionVerdict::NothingCreated => error!(
            component = "duplicates",
            errors = response.errors.len(),
            "Conversion created no hardlinks"
        ),
    }
    Ok(Some(response))
}
