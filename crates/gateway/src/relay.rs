use async_trait::async_trait;
use crewline_bus::{Dispatcher, DispatcherBuilder, EventHandler, HandlerError, RegistryError};
use crewline_events::{CHANNELS, RelayEvent};
use uuid::Uuid;

use crate::rooms::RoomRegistry;

/// Re-emits relayed events to this instance's local room members.
///
/// Emits are applied locally at the issuing instance before being
/// republished, so frames carrying our own instance id are dropped here to
/// keep local delivery single.
#[derive(Clone, Debug)]
pub(crate) struct RelayHandler {
    pub(crate) instance_id: Uuid,
    pub(crate) rooms: RoomRegistry,
}

#[async_trait]
impl EventHandler<RelayEvent> for RelayHandler {
    async fn handle(&self, event: RelayEvent) -> Result<(), HandlerError> {
        if event.origin == self.instance_id {
            return Ok(());
        }
        self.rooms.emit(&event.room, &event.event, &event.payload);
        Ok(())
    }
}

/// Builds the gateway's bus dispatcher: relay frames only.
pub(crate) fn relay_dispatcher(
    instance_id: Uuid,
    rooms: RoomRegistry,
) -> Result<Dispatcher, RegistryError> {
    DispatcherBuilder::new()
        .with::<RelayEvent, _>(RelayHandler { instance_id, rooms })
        .build(CHANNELS)
}
