//! Step annotation for multi-step agent traces

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};

use super::error::ObservabilityError;

/// Raw wall-clock timestamp a trace-bearing node must carry.
pub const START_TRACE_TIME_KEY: &str = "start_trace_time";

/// Seconds since the previous step (or the call baseline), written by the
/// annotator.
pub const LATENCY_KEY: &str = "latency";

/// Zero-based position in the recorder's timeline, written by the annotator.
pub const STEP_NUMBER_KEY: &str = "step_number";

const TRACE_KEY: &str = "trace";

/// Annotates every trace-bearing node in `output` with `latency` and
/// `step_number`.
///
/// `output` is expected to be the sequence of elements a multi-step run
/// produced, supplied in chronological order; the annotation turns whatever
/// order the sequence presents into a linear timeline. The first qualifying
/// node's latency is measured against `request_start_time` (epoch seconds),
/// every later one against its predecessor's `start_trace_time`. Step
/// numbers continue from `counter`, which advances once per qualifying node
/// and is never reset here. Nodes without `start_trace_time` are left
/// untouched; anything that is not a sequence is left untouched entirely.
pub fn annotate_trace_steps(
    output: &mut Value,
    request_start_time: f64,
    counter: &AtomicU64,
) -> Result<(), ObservabilityError> {
    let Value::Array(elements) = output else {
        return Ok(());
    };

    let mut prev_trace_time = None;

    for element in elements.iter_mut() {
        match element {
            Value::Object(node) => {
                if let Some(Value::Object(trace)) = node.get_mut(TRACE_KEY) {
                    annotate_node(trace, request_start_time, &mut prev_trace_time, counter)?;
                }
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    let Value::Object(node) = item else {
                        continue;
                    };

                    if node.contains_key(START_TRACE_TIME_KEY) {
                        annotate_node(node, request_start_time, &mut prev_trace_time, counter)?;
                    } else if let Some(Value::Object(trace)) = node.get_mut(TRACE_KEY) {
                        annotate_node(trace, request_start_time, &mut prev_trace_time, counter)?;
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn annotate_node(
    node: &mut Map<String, Value>,
    request_start_time: f64,
    prev_trace_time: &mut Option<f64>,
    counter: &AtomicU64,
) -> Result<(), ObservabilityError> {
    let Some(raw) = node.get(START_TRACE_TIME_KEY) else {
        return Ok(());
    };

    let start_trace_time = raw.as_f64().ok_or_else(|| {
        ObservabilityError::validation(
            "the key 'start_trace_time' should be present and should be a wall-clock timestamp",
        )
    })?;

    let baseline = prev_trace_time.unwrap_or(request_start_time);
    node.insert(
        LATENCY_KEY.to_string(),
        Value::from(start_trace_time - baseline),
    );
    *prev_trace_time = Some(start_trace_time);

    let step = counter.fetch_add(1, Ordering::SeqCst);
    node.insert(STEP_NUMBER_KEY.to_string(), Value::from(step));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotate(output: &mut Value, start: f64, counter: &AtomicU64) {
        annotate_trace_steps(output, start, counter).expect("annotation succeeds");
    }

    #[test]
    fn test_first_step_latency_is_measured_against_call_start() {
        let counter = AtomicU64::new(0);
        let mut output = json!([{"trace": {"start_trace_time": 100.5}}]);

        annotate(&mut output, 100.0, &counter);

        assert_eq!(output[0]["trace"]["latency"], json!(0.5));
        assert_eq!(output[0]["trace"]["step_number"], json!(0));
    }

    #[test]
    fn test_later_steps_measure_against_predecessor() {
        let counter = AtomicU64::new(0);
        let mut output = json!([
            {"trace": {"start_trace_time": 101.0}},
            {"trace": {"start_trace_time": 103.5}}
        ]);

        annotate(&mut output, 100.0, &counter);

        assert_eq!(output[0]["trace"]["latency"], json!(1.0));
        assert_eq!(output[1]["trace"]["latency"], json!(2.5));
        assert_eq!(output[0]["trace"]["step_number"], json!(0));
        assert_eq!(output[1]["trace"]["step_number"], json!(1));
    }

    #[test]
    fn test_step_numbers_continue_across_calls() {
        let counter = AtomicU64::new(0);

        let mut first = json!([{"trace": {"start_trace_time": 10.0}}]);
        annotate(&mut first, 9.0, &counter);

        let mut second = json!([
            {"trace": {"start_trace_time": 20.0}},
            {"trace": {"start_trace_time": 21.0}}
        ]);
        annotate(&mut second, 19.0, &counter);

        assert_eq!(second[0]["trace"]["step_number"], json!(1));
        assert_eq!(second[1]["trace"]["step_number"], json!(2));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_nested_sequence_elements_are_annotated() {
        let counter = AtomicU64::new(0);
        let mut output = json!([
            [
                {"start_trace_time": 50.0},
                {"trace": {"start_trace_time": 51.0}},
                {"unrelated": true}
            ]
        ]);

        annotate(&mut output, 49.0, &counter);

        assert_eq!(output[0][0]["latency"], json!(1.0));
        assert_eq!(output[0][0]["step_number"], json!(0));
        assert_eq!(output[0][1]["trace"]["latency"], json!(1.0));
        assert_eq!(output[0][1]["trace"]["step_number"], json!(1));
        assert_eq!(output[0][2], json!({"unrelated": true}));
    }

    #[test]
    fn test_nodes_without_start_trace_time_are_untouched() {
        let counter = AtomicU64::new(0);
        let mut output = json!([{"trace": {"modelInvocationInput": "..."}}]);

        annotate(&mut output, 0.0, &counter);

        assert_eq!(output[0]["trace"], json!({"modelInvocationInput": "..."}));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_non_numeric_start_trace_time_is_a_validation_error() {
        let counter = AtomicU64::new(0);
        let mut output = json!([{"trace": {"start_trace_time": "not-a-time"}}]);

        let error = annotate_trace_steps(&mut output, 0.0, &counter).unwrap_err();
        assert!(matches!(
            error,
            ObservabilityError::Validation { .. }
        ));
    }

    #[test]
    fn test_non_sequence_output_is_left_alone() {
        let counter = AtomicU64::new(0);
        let mut output = json!({"trace": {"start_trace_time": 1.0}});

        annotate(&mut output, 0.0, &counter);

        assert_eq!(output, json!({"trace": {"start_trace_time": 1.0}}));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
