//! Sequencer event log

use defmt::*;

use trundle_core::scheduler::Event;

use crate::channels::EVENT_CHANNEL;

/// Status task - logs every sequencer event
#[embassy_executor::task]
pub async fn status_task() {
    loop {
        match EVENT_CHANNEL.receive().await {
            Event::Started => info!("Bump switch pressed, starting routine"),
            Event::SegmentStarted(index) => debug!("Segment {} started", index),
            Event::SegmentFinished(index) => debug!("Segment {} finished", index),
            Event::RoutineFinished => info!("Routine finished"),
            Event::Faulted(err) => error!("Routine stopped: {}", err),
        }
    }
}
