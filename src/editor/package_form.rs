use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::editor::{CheckpointDraft, EditorOptions, apply_add};
use crate::error::{Field, ValidationError};
use crate::models::checkpoint::CheckpointStatus;
use crate::models::coordinates::Location;
use crate::models::package::{Dimensions, Package, Party, Payment, generate_tracking_number};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DetailsSection {
    pub description: String,
    pub weight: f64,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TrackingSection {
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub status: CheckpointStatus,
    #[serde(default)]
    pub current_location: Option<Location>,
    #[serde(default)]
    pub payment: Payment,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointDraft>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRole {
    Sender,
    Recipient,
}

/// One independently validated part of the package form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormSection {
    Details(DetailsSection),
    Sender(Party),
    Recipient(Party),
    Tracking(TrackingSection),
}

impl FormSection {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            FormSection::Details(details) => validate_details(details),
            FormSection::Sender(party) => validate_party(party, PartyRole::Sender),
            FormSection::Recipient(party) => validate_party(party, PartyRole::Recipient),
            FormSection::Tracking(tracking) => validate_tracking(tracking),
        }
    }
}

/// Package form state. Sections are filled and validated one at a time and
/// only combined into a `Package` at submit.
#[derive(Debug, Clone, Default)]
pub struct PackageForm {
    details: Option<DetailsSection>,
    sender: Option<Party>,
    recipient: Option<Party>,
    tracking: Option<TrackingSection>,
}

/// Wire shape of a package create/update request.
#[derive(Debug, Clone, Deserialize)]
pub struct PackagePayload {
    pub details: DetailsSection,
    pub sender: Party,
    pub recipient: Party,
    #[serde(default)]
    pub tracking: TrackingSection,
}

impl PackageForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_payload(payload: PackagePayload) -> Result<Self, ValidationError> {
        let mut form = Self::new();
        form.set(FormSection::Details(payload.details))?;
        form.set(FormSection::Sender(payload.sender))?;
        form.set(FormSection::Recipient(payload.recipient))?;
        form.set(FormSection::Tracking(payload.tracking))?;
        Ok(form)
    }

    /// Validates the section and stores it; a rejected section leaves the
    /// previous value in place.
    pub fn set(&mut self, section: FormSection) -> Result<(), ValidationError> {
        section.validate()?;

        match section {
            FormSection::Details(details) => self.details = Some(details),
            FormSection::Sender(party) => self.sender = Some(party),
            FormSection::Recipient(party) => self.recipient = Some(party),
            FormSection::Tracking(tracking) => self.tracking = Some(tracking),
        }

        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.details.is_some() && self.sender.is_some() && self.recipient.is_some()
    }

    /// Builds a new package. A missing tracking number is generated with
    /// `prefix`; initial checkpoints go through the checkpoint rules.
    pub fn into_new_package(
        self,
        prefix: &str,
        options: &EditorOptions,
        now: DateTime<Utc>,
    ) -> Result<Package, ValidationError> {
        let (details, sender, recipient, tracking) = self.into_parts()?;

        let tracking_number = tracking
            .tracking_number
            .map(|raw| raw.trim().to_string())
            .unwrap_or_else(|| generate_tracking_number(prefix));

        let mut package = Package {
            tracking_number,
            status: tracking.status.clone(),
            description: details.description.trim().to_string(),
            weight: details.weight,
            dimensions: details.dimensions,
            sender,
            recipient,
            payment: tracking.payment,
            images: details.images,
            current_location: tracking.current_location.clone(),
            manual_status: tracking.status,
            manual_location: tracking.current_location,
            checkpoints: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        for draft in tracking.checkpoints {
            apply_add(&mut package, draft, options, now)?;
        }

        Ok(package)
    }

    /// Whole-record update of `existing`. The tracking number is immutable and
    /// the checkpoint list is owned by the checkpoint editor, so both are kept.
    /// Checkpoint drafts in the update are rejected rather than dropped.
    pub fn apply_to(self, existing: &Package, now: DateTime<Utc>) -> Result<Package, ValidationError> {
        let (details, sender, recipient, tracking) = self.into_parts()?;

        if let Some(requested) = &tracking.tracking_number {
            if requested.trim() != existing.tracking_number {
                return Err(ValidationError::invalid(Field::TrackingNumber));
            }
        }

        if !tracking.checkpoints.is_empty() {
            return Err(ValidationError::invalid(Field::Checkpoints));
        }

        let mut package = Package {
            tracking_number: existing.tracking_number.clone(),
            status: tracking.status.clone(),
            description: details.description.trim().to_string(),
            weight: details.weight,
            dimensions: details.dimensions,
            sender,
            recipient,
            payment: tracking.payment,
            images: details.images,
            current_location: tracking.current_location.clone(),
            manual_status: tracking.status,
            manual_location: tracking.current_location,
            checkpoints: existing.checkpoints.clone(),
            created_at: existing.created_at,
            updated_at: now,
        };
        package.refresh_derived();

        Ok(package)
    }

    fn into_parts(self) -> Result<(DetailsSection, Party, Party, TrackingSection), ValidationError> {
        let details = self
            .details
            .ok_or_else(|| ValidationError::required(Field::Description))?;
        let sender = self
            .sender
            .ok_or_else(|| ValidationError::required(Field::SenderName))?;
        let recipient = self
            .recipient
            .ok_or_else(|| ValidationError::required(Field::RecipientName))?;

        Ok((details, sender, recipient, self.tracking.unwrap_or_default()))
    }
}

fn validate_details(details: &DetailsSection) -> Result<(), ValidationError> {
    if details.description.trim().is_empty() {
        return Err(ValidationError::required(Field::Description));
    }

    if !details.weight.is_finite() || details.weight <= 0.0 {
        return Err(ValidationError::invalid(Field::Weight));
    }

    let dimensions = &details.dimensions;
    let sides = [dimensions.length, dimensions.width, dimensions.height];
    if sides.iter().any(|side| !side.is_finite() || *side < 0.0) {
        return Err(ValidationError::invalid(Field::Dimensions));
    }

    if details.images.iter().any(|url| url.trim().is_empty()) {
        return Err(ValidationError::invalid(Field::Images));
    }

    Ok(())
}

fn validate_party(party: &Party, role: PartyRole) -> Result<(), ValidationError> {
    let (name_field, address_field) = match role {
        PartyRole::Sender => (Field::SenderName, Field::SenderAddress),
        PartyRole::Recipient => (Field::RecipientName, Field::RecipientAddress),
    };

    if party.full_name.trim().is_empty() {
        return Err(ValidationError::required(name_field));
    }

    if party.address.trim().is_empty() {
        return Err(ValidationError::required(address_field));
    }

    Ok(())
}

fn validate_tracking(tracking: &TrackingSection) -> Result<(), ValidationError> {
    if let Some(raw) = &tracking.tracking_number {
        let trimmed = raw.trim();
        let well_formed = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !well_formed {
            return Err(ValidationError::invalid(Field::TrackingNumber));
        }
    }

    if !tracking.status.is_known() {
        return Err(ValidationError::invalid(Field::Status));
    }

    if let Some(location) = &tracking.current_location {
        if !location.coordinates.is_valid() {
            return Err(ValidationError::invalid(Field::Coordinates));
        }
    }

    let payment = &tracking.payment;
    if !payment.amount.is_finite() || payment.amount < 0.0 {
        return Err(ValidationError::invalid(Field::Payment));
    }

    Ok(())
}
