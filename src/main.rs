//! Demo binary: assembles a small mission (one autopilot burn gated behind
//! a checklist, one comms pass) and runs it to completion through the
//! kernel's async variant, printing the run summary as JSON.
//!
//! Mission data loading is out of scope for the core (§1 of the design
//! spec); this binary hand-assembles a [`MissionData`] the way a loader
//! would, to exercise the kernel end to end.

use apollo11_sim_kernel::autopilot::{AutopilotCommand, AutopilotDefinition, PropulsionProfile, ScriptCommand, Tolerances};
use apollo11_sim_kernel::checklist::{ChecklistDefinition, ChecklistStepDefinition};
use apollo11_sim_kernel::kernel::{Kernel, KernelConfig, MissionData};
use apollo11_sim_kernel::math::Vec3D;
use apollo11_sim_kernel::orbit::{BurnFrame, OrbitPropagator, PrimaryBody, StateVector};
use apollo11_sim_kernel::rcs::RcsController;
use apollo11_sim_kernel::resources::{PropulsionBudget, PropulsionStage, ResourceState, ResourceSystem, Tank};
use apollo11_sim_kernel::scheduler::EventDefinition;
use apollo11_sim_kernel::score::ScoreConfig;
use std::env;

fn demo_mission() -> MissionData {
    let checklist = ChecklistDefinition {
        id: "tli_prep".to_string(),
        title: "Trans-lunar injection preparation".to_string(),
        crew_role: "CDR".to_string(),
        nominal_get_seconds: 0.0,
        steps: vec![
            ChecklistStepDefinition { action: "verify SPS gimbal trim".into(), expected_response: "nominal".into(), reference: "tli-1".into() },
            ChecklistStepDefinition { action: "arm SPS".into(), expected_response: "armed".into(), reference: "tli-2".into() },
        ],
        audio_cue_complete: Some("checklist_complete".to_string()),
    };

    let autopilot = AutopilotDefinition {
        id: "tli_burn".to_string(),
        description: "Trans-lunar injection burn".to_string(),
        sequence: vec![
            ScriptCommand { time_seconds: 0.0, command: AutopilotCommand::Throttle { level: 1.0 } },
            ScriptCommand { time_seconds: 300.0, command: AutopilotCommand::Throttle { level: 0.0 } },
        ],
        tolerances: Tolerances::default(),
        propulsion: PropulsionProfile { tank: Tank::CsmSps, mass_flow_kg_per_sec: 17.0, ullage: None },
        direction: BurnFrame::Prograde,
    };

    let mut success_effects = apollo11_sim_kernel::resources::EffectMap::new();
    success_effects.insert("power_margin_pct".to_string(), apollo11_sim_kernel::resources::EffectValue::Number(-1.5));
    let mut failure_effects = apollo11_sim_kernel::resources::EffectMap::new();
    failure_effects.insert("failure_id".to_string(), apollo11_sim_kernel::resources::EffectValue::String("tli_burn_incomplete".to_string()));

    let event = EventDefinition {
        id: "TLI".to_string(),
        get_open_seconds: 0.0,
        get_close_seconds: 1800.0,
        prerequisites: vec![],
        autopilot_id: Some("tli_burn".to_string()),
        checklist_id: Some("tli_prep".to_string()),
        success_effects,
        failure_effects,
        audio_cue_id: Some("master_caution".to_string()),
        is_comms: false,
    };

    let mut propulsion = PropulsionBudget::default();
    propulsion.set_stage(
        Tank::CsmSps,
        PropulsionStage { initial_kg: 18_000.0, reserve_kg: 1_000.0, usable_delta_v_mps: 3_100.0, remaining_kg: 18_000.0, adjustment_mps: 0.0 },
    );

    let resources = ResourceSystem::new(ResourceState::nominal(), propulsion, vec![]);

    let orbit = OrbitPropagator::new(
        PrimaryBody::earth(),
        StateVector { position_m: Vec3D::new(6_558_000.0, 0.0, 0.0), velocity_mps: Vec3D::new(0.0, 7_793.0, 0.0) },
        0.0,
    );

    MissionData {
        events: vec![event],
        autopilots: vec![autopilot],
        checklists: vec![checklist],
        rcs: RcsController::new(vec![], 0.02),
        resources,
        orbit,
        audio_catalog: apollo11_sim_kernel::audio::AudioCatalog::default(),
        score_config: ScoreConfig::default(),
        known_panels: vec!["main".to_string()],
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let until_get_seconds: f64 = env::var("SIM_UNTIL_GET_SECONDS").ok().and_then(|v| v.parse().ok()).unwrap_or(2_000.0);

    println!("\x1b[1;34m[SIM]\x1b[0m starting mission kernel, running to GET {until_get_seconds:.1}s");

    let mut kernel = Kernel::new(KernelConfig::default(), demo_mission());
    let summary = kernel
        .run_async(until_get_seconds, || false)
        .await
        .unwrap_or_else(|aborted| *aborted.0);

    println!("{}", serde_json::to_string_pretty(&summary).expect("summary always serialises"));
}
