//! The Autopilot Runner (C5): scripted command sequences, continuous
//! throttle/ullage propellant accounting, and completion fan-out (§4.5 of
//! the design spec).

mod command;
mod runtime;
mod summary;

pub use command::{AutopilotCommand, AutopilotDefinition, PropulsionProfile, ScriptCommand, Tolerances, ToleranceRange, UllageProfile};
pub use runtime::AutopilotRunner;
pub use summary::{AutopilotStatus, AutopilotSummary, BurnDeviations, BurnMetrics};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MissionLogger;
    use crate::orbit::BurnFrame;
    use crate::panels::AgcState;
    use crate::rcs::RcsController;
    use crate::resources::{PropulsionBudget, ResourceState, ResourceSystem, Tank};

    fn simple_burn_autopilot() -> AutopilotDefinition {
        AutopilotDefinition {
            id: "docking_burn".to_string(),
            description: "Short prograde burn".to_string(),
            sequence: vec![
                ScriptCommand { time_seconds: 0.0, command: AutopilotCommand::Throttle { level: 1.0 } },
                ScriptCommand { time_seconds: 5.0, command: AutopilotCommand::Throttle { level: 0.0 } },
            ],
            tolerances: Tolerances::default(),
            propulsion: PropulsionProfile { tank: Tank::CsmSps, mass_flow_kg_per_sec: 2.0, ullage: None },
            direction: BurnFrame::Prograde,
        }
    }

    #[test]
    fn completes_and_reports_propellant_usage() {
        let mut runner = AutopilotRunner::new(vec![simple_burn_autopilot()]);
        let mut resources = ResourceSystem::new(ResourceState::nominal(), PropulsionBudget::default(), vec![]);
        let mut rcs = RcsController::new(vec![], 0.01);
        let mut agc = AgcState::default();
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);

        assert!(runner.start("evt1", "docking_burn", 0.0, &mut logger));
        let mut get = 0.0;
        let mut summaries = Vec::new();
        while get <= 6.0 {
            summaries.extend(runner.update(&mut resources, &mut rcs, &mut agc, get, &mut logger));
            get += 0.5;
        }
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].status, AutopilotStatus::Completed);
        assert!(summaries[0].metrics.propellant_kg_used > 0.0);
        assert!(!runner.is_active("evt1"));
    }

    #[test]
    fn unknown_autopilot_id_refuses_to_start() {
        let mut runner = AutopilotRunner::new(vec![]);
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        assert!(!runner.start("evt1", "nonexistent", 0.0, &mut logger));
    }
}
