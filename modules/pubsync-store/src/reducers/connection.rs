use crate::actions::{ConnectionAction, SyncAction};
use crate::state::ConnectionState;

pub fn reduce(connection: &mut ConnectionState, action: &SyncAction) {
    if let SyncAction::Connection(action) = action {
        *connection = match action {
            ConnectionAction::Connecting => ConnectionState::Connecting,
            ConnectionAction::Connected => ConnectionState::Connected,
            ConnectionAction::Disconnected => ConnectionState::NotConnected,
        };
    }
}
