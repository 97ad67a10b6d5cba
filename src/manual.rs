use crate::console::{OperatorConsole, PlotView};
use crate::types::SignalKind;

/// Manual cycle cutting: the operator designates boundary indices by hand.
///
/// Repeats until a non-empty set of points is designated and confirmed. The
/// result is returned exactly as entered: unsorted and without the 0/last
/// bounding that automatic detection applies; the operator owns those choices.
pub fn manual_cut(
    position: &[f64],
    velocity: &[f64],
    _fs: f64,
    console: &mut dyn OperatorConsole,
) -> Vec<usize> {
    loop {
        console.info("Please designate the cycle boundaries on the plot.");
        let points = console.designate_points();

        // A designation left of sample 0 cannot name a sample; everything
        // else is truncated to its sample index and kept as entered.
        let cuts: Vec<usize> = points
            .iter()
            .map(|&(x, _)| x.trunc())
            .filter(|&x| x >= 0.0)
            .map(|x| x as usize)
            .collect();

        if cuts.is_empty() {
            console.warn("No points selected. Please try again.");
            continue;
        }

        console.info("Rendering the manual cuts for validation...");
        console.visualize(&PlotView {
            position,
            velocity,
            boundaries: &cuts,
            threshold: 0.0,
            signal: SignalKind::Position,
            manual_cuts: Some(&cuts),
        });

        if console.confirm("Are the manual cuts acceptable?", true) {
            return cuts;
        }
        console.warn("Restarting manual cutting process.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::ScriptedConsole;

    const POSITION: [f64; 5] = [0.0, 1.0, 0.0, 1.0, 0.0];
    const VELOCITY: [f64; 5] = [0.0, 0.0, 0.0, 0.0, 0.0];

    #[test]
    fn test_points_truncate_to_sample_indices() {
        let mut console = ScriptedConsole::new();
        console.points.push_back(vec![(1.9, 0.3), (3.2, -0.1)]);
        console.confirms.push_back(true);

        let cuts = manual_cut(&POSITION, &VELOCITY, 100.0, &mut console);
        assert_eq!(cuts, vec![1, 3]);
        assert_eq!(console.rendered, 1);
    }

    #[test]
    fn test_empty_designation_restarts() {
        let mut console = ScriptedConsole::new();
        console.points.push_back(Vec::new());
        console.points.push_back(vec![(2.0, 0.0)]);
        console.confirms.push_back(true);

        let cuts = manual_cut(&POSITION, &VELOCITY, 100.0, &mut console);
        assert_eq!(cuts, vec![2]);
        assert!(console.saw_line_containing("No points selected"));
    }

    #[test]
    fn test_decline_restarts_from_empty() {
        let mut console = ScriptedConsole::new();
        console.points.push_back(vec![(1.0, 0.0), (3.0, 0.0)]);
        console.points.push_back(vec![(4.0, 0.0)]);
        console.confirms.push_back(false);
        console.confirms.push_back(true);

        let cuts = manual_cut(&POSITION, &VELOCITY, 100.0, &mut console);
        assert_eq!(cuts, vec![4]);
        assert_eq!(console.rendered, 2);
        assert!(console.saw_line_containing("Restarting manual cutting"));
    }

    #[test]
    fn test_order_preserved_and_unbounded() {
        // Manual cuts are not sorted and not augmented with 0/last.
        let mut console = ScriptedConsole::new();
        console.points.push_back(vec![(3.0, 0.0), (1.0, 0.0)]);
        console.confirms.push_back(true);

        let cuts = manual_cut(&POSITION, &VELOCITY, 100.0, &mut console);
        assert_eq!(cuts, vec![3, 1]);
    }

    #[test]
    fn test_negative_designations_discarded() {
        let mut console = ScriptedConsole::new();
        console.points.push_back(vec![(-2.5, 0.0), (2.5, 0.0)]);
        console.confirms.push_back(true);

        let cuts = manual_cut(&POSITION, &VELOCITY, 100.0, &mut console);
        assert_eq!(cuts, vec![2]);
    }
}
