use approx::assert_abs_diff_eq;
use armor_vision_predict::{observe, Ekf, EkfParams, Filter, FilterError, Observation};
use nalgebra::{Point3, SymmetricEigen};

fn moving_target() -> Ekf {
    let mut ekf = Ekf::new(EkfParams::default(), &observe(&Point3::new(6.0, 1.0, 0.4)));
    // Give it some velocity so the motion model matters.
    for i in 1..=20 {
        let t = i as f64 * 0.02;
        ekf.predict(0.02);
        ekf.update(&observe(&Point3::new(6.0 - 0.5 * t, 1.0 + 1.5 * t, 0.4)));
    }
    ekf
}

fn min_eigenvalue(ekf: &Ekf) -> f64 {
    SymmetricEigen::new(*ekf.covariance()).eigenvalues.min()
}

#[test]
fn coasting_grows_trace_and_follows_motion_model() {
    let mut ekf = moving_target();
    let mut previous_trace = ekf.covariance().trace();
    let mut expected = *ekf.state();

    for _ in 0..50 {
        ekf.predict(0.02);
        expected[0] += expected[1] * 0.02;
        expected[2] += expected[3] * 0.02;

        let trace = ekf.covariance().trace();
        assert!(trace >= previous_trace, "{trace} < {previous_trace}");
        previous_trace = trace;

        for i in 0..5 {
            assert_abs_diff_eq!(ekf.state()[i], expected[i], epsilon = 1e-9);
        }
    }
}

#[test]
fn coasting_covariance_growth_is_bounded() {
    let mut ekf = Ekf::new(
        EkfParams {
            max_covariance_trace: 500.0,
            ..Default::default()
        },
        &observe(&Point3::new(4.0, 0.0, 0.0)),
    );
    let mut traces = Vec::new();
    for _ in 0..10_000 {
        ekf.predict(0.1);
        traces.push(ekf.covariance().trace());
    }
    assert!(traces.iter().all(|t| t.is_finite() && *t <= 500.0 + 1e-6));
    assert!(min_eigenvalue(&ekf) >= -1e-9);
}

#[test]
fn zero_innovation_keeps_state_and_does_not_grow_covariance() {
    let mut ekf = moving_target();
    ekf.predict(0.02);
    let prior_state = *ekf.state();
    let prior_trace = ekf.covariance().trace();

    let z = ekf.expected_observation();
    ekf.try_update(&z).unwrap();

    for i in 0..5 {
        assert_abs_diff_eq!(ekf.state()[i], prior_state[i], epsilon = 1e-12);
    }
    assert!(ekf.covariance().trace() <= prior_trace + 1e-12);
}

#[test]
fn covariance_stays_symmetric_psd() {
    let mut ekf = moving_target();
    for i in 0..200 {
        ekf.predict(0.01);
        if i % 3 != 0 {
            let t = i as f64 * 0.01;
            ekf.update(&observe(&Point3::new(5.0 + t.sin(), 2.0 * t.cos(), 0.3)));
        }
        let p = ekf.covariance();
        assert_abs_diff_eq!(*p, p.transpose(), epsilon = 1e-12);
        assert!(min_eigenvalue(&ekf) >= -1e-9);
    }
}

#[test]
fn singular_innovation_is_skipped() {
    let params = EkfParams {
        initial_position_variance: 0.0,
        initial_velocity_variance: 0.0,
        process_position_noise: 0.0,
        process_velocity_noise: 0.0,
        process_height_noise: 0.0,
        yaw_noise: 0.0,
        pitch_noise: 0.0,
        distance_noise: 0.0,
        ..Default::default()
    };
    let mut ekf = Ekf::new(params, &observe(&Point3::new(3.0, 1.0, 0.0)));
    ekf.predict(0.05);
    let prior_state = *ekf.state();
    let prior_cov = *ekf.covariance();

    let z = Observation::new(0.5, 0.1, 4.0);
    assert_eq!(ekf.try_update(&z), Err(FilterError::SingularInnovation));

    ekf.update(&z);
    assert_eq!(*ekf.state(), prior_state);
    assert_eq!(*ekf.covariance(), prior_cov);
    assert!(ekf.state().iter().all(|v| v.is_finite()));
}

#[test]
fn lead_prediction_does_not_touch_estimate() {
    let ekf = moving_target();
    let before = *ekf.state();
    let now = ekf.expected_observation();
    let ahead = ekf.predicted_observation(0.3);
    assert_eq!(*ekf.state(), before);
    // Target is moving towards +y, so yaw increases.
    assert!(ahead[0] > now[0]);
}
