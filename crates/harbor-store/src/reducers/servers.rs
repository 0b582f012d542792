use harbor_common::types::Server;
use harbor_common::{Action, Envelope};

use crate::state::ServersState;

pub fn reduce(mut slice: ServersState, envelope: &Envelope) -> ServersState {
    match &envelope.action {
        Action::ServerAdded { url, title } => {
            // url is the identity key; adding an existing server is a no-op
            if !slice.contains(url) {
                slice.servers.push(Server::new(url.clone(), title.clone()));
            }
            slice
        }
        Action::ServerRemoved { url } => {
            slice.servers.retain(|s| &s.url != url);
            slice
        }
        Action::ServersReordered { urls } => {
            let mut reordered = Vec::with_capacity(slice.servers.len());
            for url in urls {
                if let Some(pos) = slice.servers.iter().position(|s| &s.url == url) {
                    reordered.push(slice.servers.remove(pos));
                }
            }
            // servers missing from the order list keep their relative order
            reordered.append(&mut slice.servers);
            slice.servers = reordered;
            slice
        }
        Action::ServerTitleChanged { url, title } => {
            if let Some(server) = slice.get_mut(url) {
                server.title = title.clone();
            }
            slice
        }
        Action::ServerPathChanged { url, path } => {
            if let Some(server) = slice.get_mut(url) {
                server.last_path = Some(path.clone());
            }
            slice
        }
        Action::ServerFaviconChanged { url, favicon } => {
            if let Some(server) = slice.get_mut(url) {
                server.favicon = Some(favicon.clone());
            }
            slice
        }
        Action::ServerStyleChanged { url, style } => {
            if let Some(server) = slice.get_mut(url) {
                server.style = Some(style.clone());
            }
            slice
        }
        Action::ServerPresenceChanged { url, presence } => {
            if let Some(server) = slice.get_mut(url) {
                server.presence = Some(*presence);
            }
            slice
        }
        Action::ServerVersionChanged { url, version } => {
            if let Some(server) = slice.get_mut(url) {
                server.version = Some(version.clone());
            }
            slice
        }
        Action::ServerAttached {
            url,
            web_contents_id,
        } => {
            if let Some(server) = slice.get_mut(url) {
                server.web_contents_id = Some(*web_contents_id);
            }
            slice
        }
        Action::ServerLoadFailed { url, failure } => {
            if let Some(server) = slice.get_mut(url) {
                server.failure = Some(failure.clone());
            }
            slice
        }
        Action::ServerLoadSucceeded { url } => {
            if let Some(server) = slice.get_mut(url) {
                server.failure = None;
            }
            slice
        }
        _ => slice,
    }
}
