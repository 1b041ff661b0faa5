use std::collections::BTreeSet;
use std::sync::Arc;

use crate::adapters::AlarmPanel;
use crate::models::AlarmZone;

pub struct AlarmZoneReporter {
    alarm: Arc<dyn AlarmPanel>,
    zones: Vec<AlarmZone>,
}

impl AlarmZoneReporter {
    pub fn new(alarm: Arc<dyn AlarmPanel>, zones: Vec<AlarmZone>) -> Self {
        Self { alarm, zones }
    }

    /// `<label> [*]` for violated zones, `<label> [ ]` otherwise, in declared
    /// order. Every marker is `?` when the panel cannot be asked.
    pub fn report(&self) -> Vec<String> {
        let violated = match self.alarm.violated_zones() {
            Ok(violated) => Some(violated),
            Err(e) => {
                tracing::warn!("Cannot read violated zones: {}", e);
                None
            }
        };

        self.zones
            .iter()
            .map(|zone| format!("{} [{}]", zone.label, marker(zone, violated.as_ref())))
            .collect()
    }

    /// The panel's clock followed by the zone report.
    pub fn status(&self) -> Vec<String> {
        let clock = match self.alarm.current_time() {
            Ok(time) => format!("Alarm panel time: {time}"),
            Err(e) => {
                tracing::warn!("Cannot read the alarm panel clock: {}", e);
                String::from("Alarm panel time: unknown")
            }
        };

        let mut lines = vec![clock];
        lines.extend(self.report());
        lines
    }
}

fn marker(zone: &AlarmZone, violated: Option<&BTreeSet<u16>>) -> char {
    match violated {
        Some(violated) if violated.contains(&zone.id) => '*',
        Some(_) => ' ',
        None => '?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedAlarmPanel;

    fn zones() -> Vec<AlarmZone> {
        vec![
            AlarmZone { id: 9, label: "Garaz drzwi".into() },
            AlarmZone { id: 8, label: "Garaz brama".into() },
        ]
    }

    #[test]
    fn test_report_follows_declared_order() {
        let reporter = AlarmZoneReporter::new(Arc::new(ScriptedAlarmPanel::with_violated([8, 3])), zones());

        assert_eq!(reporter.report(), vec!["Garaz drzwi [ ]", "Garaz brama [*]"]);
    }

    #[test]
    fn test_report_marks_unknown_when_unreachable() {
        let reporter = AlarmZoneReporter::new(Arc::new(ScriptedAlarmPanel::unreachable()), zones());

        assert_eq!(reporter.report(), vec!["Garaz drzwi [?]", "Garaz brama [?]"]);
    }

    #[test]
    fn test_status_prepends_panel_time_verbatim() {
        let panel = ScriptedAlarmPanel::with_violated([9]).with_time("2024-06-21 18:30:05");
        let reporter = AlarmZoneReporter::new(Arc::new(panel), zones());

        assert_eq!(
            reporter.status(),
            vec!["Alarm panel time: 2024-06-21 18:30:05", "Garaz drzwi [*]", "Garaz brama [ ]"]
        );
    }

    #[test]
    fn test_status_without_panel() {
        let reporter = AlarmZoneReporter::new(Arc::new(ScriptedAlarmPanel::unreachable()), zones());

        assert_eq!(reporter.status()[0], "Alarm panel time: unknown");
    }
}
