use std::sync::Arc;

use autohome_core::mock::{
    CollectingFeedback, FixedSun, FixtureBus, ManualClock, RecordingPinBank, ScriptedAlarmPanel,
    test_settings,
};
use autohome_core::{AutoHome, Collaborators};
use autohome_server::app::create_app;
use axum::Router;
use time::macros::time;

pub struct MockApp {
    pub router: Router,
    pub bank: RecordingPinBank,
    pub feedback: Arc<CollectingFeedback>,
}

impl MockApp {
    pub fn new() -> Self {
        Self::with_bank(RecordingPinBank::new())
    }

    pub fn with_bank(bank: RecordingPinBank) -> Self {
        let settings = test_settings();
        let feedback = Arc::new(CollectingFeedback::default());

        let home = AutoHome::new(
            &settings,
            Collaborators {
                pins: Box::new(bank.clone()),
                bus: Arc::new(FixtureBus::new().with_sample("28-outside", "t=-2500")),
                alarm: Arc::new(ScriptedAlarmPanel::with_violated([9])),
                sun: Arc::new(FixedSun::at(time!(18:55))),
                clock: Arc::new(ManualClock::default()),
                feedback: feedback.clone(),
            },
        );

        Self {
            router: create_app(Arc::new(home), &settings.server.prefix),
            bank,
            feedback,
        }
    }
}
