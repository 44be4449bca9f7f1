//! Dual-problem symmetry.
//!
//! Reversing a planning problem — swap start and target, negate the flow,
//! integrate backward in time from the target — must reproduce the
//! forward solution once the backward samples are put back in time order,
//! up to the integration step error.

use std::sync::Arc;

use zermelo_core::flow::{LinearFlow, ScaledFlow};
use zermelo_core::{
    CoordKind, Domain, EulerIntegrator, FixedHeading, FlowField, IntegratorConfig, Mat2, StopCond,
    Vec2,
};

const STEP: f64 = 1e-3;
const STEPS: usize = 1000;
const HEADING: f64 = 0.7;

fn shear_flow() -> Arc<dyn FlowField> {
    let gradient = Mat2::new(0.0, 0.3, 0.0, 0.0);
    Arc::new(LinearFlow::new(
        gradient,
        Vec2::zeros(),
        Vec2::new(0.2, 0.1),
    ))
}

fn run(
    flow: Arc<dyn FlowField>,
    t_init: f64,
    backward: bool,
    x_init: Vec2,
) -> zermelo_core::Trajectory {
    let config = IntegratorConfig {
        step: STEP,
        max_iter: STEPS,
        t_init,
        backward,
        ..IntegratorConfig::default()
    };
    let integrator = EulerIntegrator::new(
        flow,
        Arc::new(FixedHeading(HEADING)),
        CoordKind::Cartesian,
        1.0,
        Domain::unbounded(),
        StopCond::Never,
        config,
    );
    integrator.integrate(x_init)
}

#[test]
fn backward_integration_of_the_mirrored_problem_retraces_forward() {
    let flow = shear_flow();
    let forward = run(flow.clone(), 0.0, false, Vec2::zeros());
    assert_eq!(forward.last_index(), STEPS);
    let end = forward.points()[STEPS];

    let mirrored: Arc<dyn FlowField> = Arc::new(ScaledFlow::reversed(flow));
    let backward = run(mirrored, STEP * STEPS as f64, true, end).reversed_in_time();
    assert_eq!(backward.last_index(), STEPS);

    // Endpoints swap roles
    let back_start = backward.points()[0];
    assert!(
        back_start.norm() < 5.0 * STEP,
        "reversed start should sit at the forward origin, got {back_start:?}"
    );

    // Pointwise agreement within integration step error
    for k in (0..=STEPS).step_by(100) {
        let delta = (forward.points()[k] - backward.points()[k]).norm();
        assert!(
            delta < 5.0 * STEP,
            "sample {k} diverged by {delta}"
        );
        let dt = (forward.timestamps()[k] - backward.timestamps()[k]).abs();
        assert!(dt < 1e-9, "timestamps diverged by {dt} at sample {k}");
    }
}
