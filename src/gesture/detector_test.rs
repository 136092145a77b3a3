use std::error::Error;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::gesture::{
    detector::GestureEventDetector,
    event::{Finger, GestureEvent},
    landmarks::{HandLandmarks, Landmark, INDEX_TIP, LANDMARK_COUNT, MIDDLE_TIP, THUMB_TIP},
    GestureError,
};

fn hand_with_distances(index: f64, middle: f64) -> HandLandmarks {
    let mut points = vec![Landmark::new(0.9, 0.9, 0.0); LANDMARK_COUNT];
    points[THUMB_TIP] = Landmark::new(0.5, 0.5, 0.3);
    points[INDEX_TIP] = Landmark::new(0.5 + index, 0.5, -0.4);
    points[MIDDLE_TIP] = Landmark::new(0.5, 0.5 + middle, 0.0);
    HandLandmarks::new(points).unwrap()
}

#[test]
fn test_click_release_scenario() -> Result<(), Box<dyn Error>> {
    let mut detector = GestureEventDetector::new(0.06, 0.10)?;
    let distances = [0.05, 0.05, 0.08, 0.11];

    let mut events = Vec::new();
    for (frame, distance) in distances.into_iter().enumerate() {
        if let Some(event) = detector.update_finger(Finger::Index, distance) {
            events.push((frame, event));
        }
    }

    assert_eq!(
        events,
        vec![
            (0, GestureEvent::Clicked(Finger::Index)),
            (3, GestureEvent::Released(Finger::Index)),
        ]
    );

    Ok(())
}

#[test]
fn test_landmark_distances_ignore_depth() -> Result<(), Box<dyn Error>> {
    let mut detector = GestureEventDetector::default();
    let hand = hand_with_distances(0.05, 0.5);
    assert!((hand.touch_distance(Finger::Index) - 0.05).abs() < 1e-12);

    let events = detector.process(Some(&hand));
    assert_eq!(events, vec![GestureEvent::Clicked(Finger::Index)]);

    // Held: no repeated events
    let events = detector.process(Some(&hand));
    assert!(events.is_empty());

    // Middle touches while index lets go in the same frame
    let hand = hand_with_distances(0.2, 0.01);
    let events = detector.process(Some(&hand));
    assert_eq!(
        events,
        vec![
            GestureEvent::Released(Finger::Index),
            GestureEvent::Clicked(Finger::Middle),
        ]
    );

    Ok(())
}

#[test]
fn test_no_hand_releases_pressed_fingers() -> Result<(), Box<dyn Error>> {
    let mut detector = GestureEventDetector::new(0.06, 0.10)?;
    detector.process_distances(Some([0.01, 0.5, 0.02]));
    assert!(detector.is_pressed(Finger::Index));
    assert!(!detector.is_pressed(Finger::Middle));
    assert!(detector.is_pressed(Finger::Ring));

    let events = detector.process(None);
    assert_eq!(
        events,
        vec![
            GestureEvent::Released(Finger::Index),
            GestureEvent::Released(Finger::Ring),
        ]
    );
    for finger in Finger::ALL {
        assert!(!detector.is_pressed(finger));
    }
    assert!(detector.process(None).is_empty());

    Ok(())
}

#[test]
fn test_invalid_thresholds() {
    assert!(matches!(
        GestureEventDetector::new(0.10, 0.10),
        Err(GestureError::InvalidThresholds { .. })
    ));
    assert!(GestureEventDetector::new(0.2, 0.1).is_err());
    assert!(GestureEventDetector::new(f64::NAN, 0.1).is_err());
    assert!(matches!(
        HandLandmarks::new(vec![Landmark::default(); 5]),
        Err(GestureError::InvalidLandmarks {
            expected: 21,
            actual: 5
        })
    ));
}

#[test]
fn test_hysteresis_property() -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let touch = rng.random_range(0.01..0.2);
        let release = touch + rng.random_range(0.001..0.2);
        let mut detector = GestureEventDetector::new(touch, release)?;

        let mut clicks = [0i64; 3];
        let mut releases = [0i64; 3];
        let mut last: [Option<GestureEvent>; 3] = [None; 3];

        for _ in 0..300 {
            let frame = if rng.random_bool(0.05) {
                None
            } else {
                Some([
                    rng.random_range(0.0..0.4),
                    rng.random_range(0.0..0.4),
                    rng.random_range(0.0..0.4),
                ])
            };

            for event in detector.process_distances(frame) {
                let finger = match event {
                    GestureEvent::Clicked(finger) => {
                        clicks[finger.index()] += 1;
                        finger
                    }
                    GestureEvent::Released(finger) => {
                        releases[finger.index()] += 1;
                        finger
                    }
                    GestureEvent::Continuous(_) => unreachable!(),
                };

                // Events for a finger always alternate
                let previous = last[finger.index()];
                match (previous, event) {
                    (Some(GestureEvent::Clicked(_)), GestureEvent::Clicked(_))
                    | (Some(GestureEvent::Released(_)), GestureEvent::Released(_))
                    | (None, GestureEvent::Released(_)) => {
                        panic!("{event} followed {previous:?}")
                    }
                    _ => (),
                }
                last[finger.index()] = Some(event);
            }
        }

        for finger in Finger::ALL {
            let i = finger.index();
            assert!((clicks[i] - releases[i]).abs() <= 1);
            assert_eq!(detector.is_pressed(finger), clicks[i] > releases[i]);
        }
    }

    Ok(())
}
