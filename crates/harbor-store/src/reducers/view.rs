use harbor_common::types::View;
use harbor_common::{Action, Envelope};

use crate::state::ViewState;

pub fn reduce(mut slice: ViewState, envelope: &Envelope) -> ViewState {
    match &envelope.action {
        Action::ViewChanged { view } => {
            slice.view = view.clone();
            slice
        }
        Action::SideBarToggled { visible } => {
            slice.sidebar_visible = *visible;
            slice
        }
        // removing the currently shown server falls back to home
        Action::ServerRemoved { url } => {
            if slice.view == View::Server(url.clone()) {
                slice.view = View::Home;
            }
            slice
        }
        _ => slice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_common::types::ServerUrl;

    fn url(s: &str) -> ServerUrl {
        ServerUrl::parse(s).unwrap()
    }

    #[test]
    fn view_changes() {
        let slice = reduce(
            ViewState::default(),
            &Envelope::new(Action::ViewChanged {
                view: View::Downloads,
            }),
        );
        assert_eq!(slice.view, View::Downloads);
    }

    #[test]
    fn sidebar_toggles() {
        let slice = reduce(
            ViewState::default(),
            &Envelope::new(Action::SideBarToggled { visible: false }),
        );
        assert!(!slice.sidebar_visible);
    }

    #[test]
    fn removing_the_shown_server_falls_back_to_home() {
        let slice = reduce(
            ViewState::default(),
            &Envelope::new(Action::ViewChanged {
                view: View::Server(url("a.test")),
            }),
        );
        let slice = reduce(
            slice,
            &Envelope::new(Action::ServerRemoved { url: url("a.test") }),
        );
        assert_eq!(slice.view, View::Home);
    }

    #[test]
    fn removing_another_server_keeps_the_view() {
        let slice = reduce(
            ViewState::default(),
            &Envelope::new(Action::ViewChanged {
                view: View::Server(url("a.test")),
            }),
        );
        let slice = reduce(
            slice,
            &Envelope::new(Action::ServerRemoved { url: url("b.test") }),
        );
        assert_eq!(slice.view, View::Server(url("a.test")));
    }
}
