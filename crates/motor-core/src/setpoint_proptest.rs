#[cfg(test)]
mod proptest_setpoint {
    use crate::error::StateError;
    use crate::setpoint::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        // Property: every setpoint inside the closed range is accepted unchanged
        #[test]
        fn in_range_setpoints_accepted(rpm in 0.0f64..=3000.0) {
            let result = Setpoint::<Unvalidated>::new(rpm).validate(&SetpointRange::default());
            prop_assert!(result.is_ok(), "rejected {} rpm: {:?}", rpm, result);
            prop_assert_eq!(result.unwrap().rpm(), rpm);
        }

        // Property: anything above the full scale is rejected as out of range
        #[test]
        fn overspeed_always_rejected(rpm in 3000.0001f64..1.0e6) {
            let result = Setpoint::<Unvalidated>::new(rpm).validate(&SetpointRange::default());
            let is_out_of_range = matches!(result, Err(StateError::OutOfRange { .. }));
            prop_assert!(is_out_of_range, "Expected OutOfRange, got {:?}", result);
        }

        // Property: negative requests are rejected as out of range
        #[test]
        fn negative_always_rejected(rpm in -1.0e6f64..-0.0001) {
            let result = Setpoint::<Unvalidated>::new(rpm).validate(&SetpointRange::default());
            let is_out_of_range = matches!(result, Err(StateError::OutOfRange { .. }));
            prop_assert!(is_out_of_range, "Expected OutOfRange, got {:?}", result);
        }
    }
}
