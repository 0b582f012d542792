use harbor_common::{Action, Envelope};

use crate::state::{UpdateState, UpdateStatus};

pub fn reduce(mut slice: UpdateState, envelope: &Envelope) -> UpdateState {
    match &envelope.action {
        Action::UpdateCheckStarted => {
            slice.status = UpdateStatus::Checking;
            slice
        }
        Action::UpdateAvailable { version } => {
            slice.status = UpdateStatus::Available {
                version: version.clone(),
            };
            slice
        }
        Action::UpdateNotAvailable => {
            slice.status = UpdateStatus::UpToDate;
            slice
        }
        Action::UpdateDownloaded { version } => {
            slice.status = UpdateStatus::Downloaded {
                version: version.clone(),
            };
            slice
        }
        Action::UpdateErrored { message } => {
            slice.status = UpdateStatus::Errored {
                message: message.clone(),
            };
            slice
        }
        _ => slice,
    }
}
