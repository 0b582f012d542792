use harbor_common::{Action, Envelope};

use crate::state::DownloadsState;

pub fn reduce(mut slice: DownloadsState, envelope: &Envelope) -> DownloadsState {
    match &envelope.action {
        Action::DownloadCreated { item } => {
            slice.items.insert(item.id, item.clone());
            slice
        }
        Action::DownloadUpdated { id, patch } => {
            if let Some(item) = slice.items.get_mut(id) {
                item.apply(patch);
            }
            slice
        }
        Action::DownloadRemoved { id } => {
            slice.items.remove(id);
            slice
        }
        Action::DownloadsCleared => {
            slice.items.clear();
            slice
        }
        _ => slice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_common::types::{
        DownloadId, DownloadItem, DownloadPatch, DownloadState, DownloadStatus, ServerUrl,
    };

    fn item(id: i64) -> DownloadItem {
        DownloadItem {
            id: DownloadId(id),
            state: DownloadState::Progressing,
            status: DownloadStatus::All,
            file_name: "file.bin".into(),
            received_bytes: 0,
            total_bytes: 100,
            start_time: chrono::Utc::now(),
            end_time: None,
            url: "https://a.test/file.bin".into(),
            server_url: ServerUrl::parse("a.test").unwrap(),
            server_title: "A".into(),
            mime_type: "application/octet-stream".into(),
            save_path: "/tmp/file.bin".into(),
        }
    }

    #[test]
    fn create_update_remove() {
        let slice = reduce(
            DownloadsState::default(),
            &Envelope::new(Action::DownloadCreated { item: item(1) }),
        );
        assert_eq!(slice.items.len(), 1);

        let slice = reduce(
            slice,
            &Envelope::new(Action::DownloadUpdated {
                id: DownloadId(1),
                patch: DownloadPatch {
                    received_bytes: Some(50),
                    ..Default::default()
                },
            }),
        );
        assert_eq!(slice.items[&DownloadId(1)].received_bytes, 50);

        let slice = reduce(
            slice,
            &Envelope::new(Action::DownloadRemoved { id: DownloadId(1) }),
        );
        assert!(slice.items.is_empty());
    }

    #[test]
    fn update_for_unknown_id_is_a_no_op() {
        let slice = reduce(
            DownloadsState::default(),
            &Envelope::new(Action::DownloadUpdated {
                id: DownloadId(9),
                patch: DownloadPatch {
                    received_bytes: Some(50),
                    ..Default::default()
                },
            }),
        );
        assert!(slice.items.is_empty());
    }

    #[test]
    fn clear_removes_everything() {
        let mut slice = DownloadsState::default();
        for id in [1, 2, 3] {
            slice = reduce(
                slice,
                &Envelope::new(Action::DownloadCreated { item: item(id) }),
            );
        }
        let slice = reduce(slice, &Envelope::new(Action::DownloadsCleared));
        assert!(slice.items.is_empty());
    }

    #[test]
    fn items_iterate_in_id_order() {
        let mut slice = DownloadsState::default();
        for id in [30, 10, 20] {
            slice = reduce(
                slice,
                &Envelope::new(Action::DownloadCreated { item: item(id) }),
            );
        }
        let ids: Vec<_> = slice.items.keys().copied().collect();
        assert_eq!(ids, vec![DownloadId(10), DownloadId(20), DownloadId(30)]);
    }

    #[test]
    fn command_actions_do_not_touch_the_slice() {
        let slice = reduce(
            DownloadsState::default(),
            &Envelope::new(Action::DownloadCreated { item: item(1) }),
        );
        let before = slice.clone();
        let slice = reduce(
            slice,
            &Envelope::new(Action::DownloadPauseRequested { id: DownloadId(1) }),
        );
        assert_eq!(slice, before);
    }
}
