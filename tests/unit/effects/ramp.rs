use super::*;

fn ramp(angle: f64, stops: &[(f64, f64)]) -> Ramp {
    Ramp {
        angle,
        stops: stops
            .iter()
            .map(|&(offset, weight)| RampStop { offset, weight })
            .collect(),
    }
}

#[test]
fn no_stops_weighs_everything_at_one() {
    let f = RampField::new(&ramp(0.0, &[]), 10, 10);
    assert_eq!(f.weight_at(0, 0), 1.0);
    assert_eq!(f.weight_at(9, 9), 1.0);
}

#[test]
fn horizontal_ramp_increases_left_to_right() {
    let f = RampField::new(&ramp(0.0, &[(0.0, 0.0), (1.0, 1.0)]), 100, 4);
    let left = f.weight_at(0, 2);
    let mid = f.weight_at(50, 2);
    let right = f.weight_at(99, 2);
    assert!(left < 0.02);
    assert!((mid - 0.505).abs() < 0.02);
    assert!(right > 0.98);
    // Vertical position does not matter at 0 degrees.
    assert_eq!(f.weight_at(30, 0), f.weight_at(30, 3));
}

#[test]
fn vertical_ramp_follows_y() {
    let f = RampField::new(&ramp(90.0, &[(0.0, 1.0), (1.0, 0.0)]), 4, 100);
    assert!(f.weight_at(2, 0) > 0.98);
    assert!(f.weight_at(2, 99) < 0.02);
}

#[test]
fn weights_hold_past_outer_stops_and_sort_input() {
    let f = RampField::new(&ramp(0.0, &[(0.8, 0.2), (0.2, 0.6)]), 100, 1);
    assert!((f.weight_at(0, 0) - 0.6).abs() < 1e-6);
    assert!((f.weight_at(99, 0) - 0.2).abs() < 1e-6);
    let mid = f.weight_at(50, 0);
    assert!(mid < 0.6 && mid > 0.2);
}

#[test]
fn field_for_none_is_none() {
    assert!(field_for(None, 3, 3).is_none());
}
