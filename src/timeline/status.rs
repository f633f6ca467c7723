use serde::Serialize;

use crate::models::checkpoint::CheckpointStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Gray,
    Blue,
    Indigo,
    Teal,
    Amber,
    Orange,
    Purple,
    Green,
    Red,
}

pub fn status_display_text(status: &CheckpointStatus) -> String {
    let label = match status {
        CheckpointStatus::Pending => "Pending",
        CheckpointStatus::InWarehouse => "In Warehouse",
        CheckpointStatus::InTransit => "In Transit",
        CheckpointStatus::Arrived => "Arrived",
        CheckpointStatus::CustomsCheck => "Customs Check",
        CheckpointStatus::CustomsHold => "Customs Hold",
        CheckpointStatus::PackageDeclared => "Package Declared",
        CheckpointStatus::CustomsCleared => "Customs Cleared",
        CheckpointStatus::Delivered => "Delivered",
        CheckpointStatus::Exception => "Exception",
        CheckpointStatus::Other(raw) => return title_case(raw),
    };

    label.to_string()
}

pub fn status_color(status: &CheckpointStatus) -> StatusColor {
    match status {
        CheckpointStatus::Pending => StatusColor::Gray,
        CheckpointStatus::InWarehouse => StatusColor::Blue,
        CheckpointStatus::InTransit => StatusColor::Indigo,
        CheckpointStatus::Arrived => StatusColor::Teal,
        CheckpointStatus::CustomsCheck => StatusColor::Amber,
        CheckpointStatus::CustomsHold => StatusColor::Orange,
        CheckpointStatus::PackageDeclared => StatusColor::Purple,
        CheckpointStatus::CustomsCleared => StatusColor::Teal,
        CheckpointStatus::Delivered => StatusColor::Green,
        CheckpointStatus::Exception => StatusColor::Red,
        CheckpointStatus::Other(_) => StatusColor::Gray,
    }
}

/// Fixed weight in [0, 100]. Monotonic along pending → delivered; `Exception`
/// is pinned at 90 outside that ordering.
pub fn progress_percent(status: &CheckpointStatus) -> u8 {
    match status {
        CheckpointStatus::Pending => 10,
        CheckpointStatus::InWarehouse => 30,
        CheckpointStatus::InTransit => 50,
        CheckpointStatus::Arrived => 70,
        CheckpointStatus::CustomsCheck => 80,
        CheckpointStatus::CustomsHold => 85,
        CheckpointStatus::Exception => 90,
        CheckpointStatus::Delivered => 100,
        CheckpointStatus::PackageDeclared
        | CheckpointStatus::CustomsCleared
        | CheckpointStatus::Other(_) => 0,
    }
}

fn title_case(raw: &str) -> String {
    raw.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
