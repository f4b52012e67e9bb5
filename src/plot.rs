//! Mutable visual model of the scatter plot: a primary point layer, a
//! highlight-ring overlay for selected countries, a title used for error
//! feedback, and an eased position transition for relayouts.
//!
//! Updates are staged and committed in one step, so a frame never observes
//! new positions with old colors or half-reset opacities.

use crate::selection::SelectionSet;
use eframe::egui::Color32;

/// Relayout transition length.
pub const ANIMATION_MS: f64 = 2000.0;

pub const EMPTY_SELECTION_TITLE: &str = "Please Select At Least One Category...";
pub const FETCH_ERROR_TITLE: &str = "Error getting data from URL";
pub const TOO_FEW_COUNTRIES_TITLE: &str = "Not Enough Countries Left For This Selection...";
pub const GENERIC_ERROR_TITLE: &str = "Something Went Wrong :(";

/// A complete relayout payload: one entry per country, row-aligned.
pub struct PlotUpdate {
    pub countries: Vec<String>,
    pub positions: Vec<[f32; 2]>,
    pub colors: Vec<Color32>,
}

pub struct ScatterLayer {
    pub countries: Vec<String>,
    /// Target positions; during a transition the displayed positions come
    /// from [`PlotState::positions_at`].
    pub positions: Vec<[f32; 2]>,
    pub colors: Vec<Color32>,
    pub opacities: Vec<f32>,
}

/// Ring markers over the currently selected countries. Selected countries
/// missing from the layout are filtered here, silently.
#[derive(Default)]
pub struct HighlightLayer {
    /// Indices into the primary layer, in selection order.
    pub indices: Vec<usize>,
    /// Target positions of the highlighted points.
    pub positions: Vec<[f32; 2]>,
    pub opacity: f32,
}

struct Transition {
    from: Vec<[f32; 2]>,
    started_at: f64,
    duration_s: f64,
}

pub struct PlotState {
    pub primary: ScatterLayer,
    pub highlight: HighlightLayer,
    pub title: String,
    pub display_names: bool,
    transition: Option<Transition>,
}

impl PlotState {
    /// Full build on first successful fetch+process. No entrance animation.
    pub fn build(update: PlotUpdate) -> Self {
        let n = update.countries.len();
        Self {
            primary: ScatterLayer {
                countries: update.countries,
                positions: update.positions,
                colors: update.colors,
                opacities: vec![1.0; n],
            },
            highlight: HighlightLayer::default(),
            title: String::new(),
            display_names: true,
            transition: None,
        }
    }

    /// In-place relayout. Positions animate from where each country is
    /// currently displayed; countries new to the layout appear at their
    /// target. Colors, opacities, title and the highlight overlay are all
    /// committed together with the positions.
    pub fn apply(&mut self, update: PlotUpdate, selection: &SelectionSet, now: f64) {
        let displayed = self.positions_at(now);

        // Stage everything before touching self, then commit field by
        // field with no early return in between.
        let from: Vec<[f32; 2]> = update
            .countries
            .iter()
            .zip(&update.positions)
            .map(|(country, &target)| {
                self.primary
                    .countries
                    .iter()
                    .position(|c| c == country)
                    .map(|i| displayed[i])
                    .unwrap_or(target)
            })
            .collect();
        let animate = from
            .iter()
            .zip(&update.positions)
            .any(|(a, b)| a[0] != b[0] || a[1] != b[1]);
        let n = update.countries.len();

        self.primary = ScatterLayer {
            countries: update.countries,
            positions: update.positions,
            colors: update.colors,
            opacities: vec![1.0; n],
        };
        self.title.clear();
        self.display_names = true;
        self.transition = animate.then_some(Transition {
            from,
            started_at: now,
            duration_s: ANIMATION_MS / 1000.0,
        });
        self.refresh_highlight(selection);
    }

    /// Hides every point and shows `title` as the only feedback. Applied
    /// without animation.
    pub fn set_empty_state(&mut self, title: &str) {
        self.transition = None;
        for o in &mut self.primary.opacities {
            *o = 0.0;
        }
        self.highlight.opacity = 0.0;
        self.display_names = false;
        self.title = title.to_string();
    }

    /// Recomputes the highlight overlay as the subsequence of present
    /// countries in selection order. Never animated: rings appear and
    /// disappear in place.
    pub fn refresh_highlight(&mut self, selection: &SelectionSet) {
        let mut indices = Vec::with_capacity(selection.len());
        let mut positions = Vec::with_capacity(selection.len());
        for country in selection.iter() {
            if let Some(i) = self.primary.countries.iter().position(|c| c == country) {
                indices.push(i);
                positions.push(self.primary.positions[i]);
            }
        }
        self.highlight = HighlightLayer {
            indices,
            positions,
            opacity: 1.0,
        };
    }

    /// Permanent labels vs tooltip-only.
    pub fn toggle_labels(&mut self) {
        self.display_names = !self.display_names;
    }

    /// Displayed positions at `now`, eased between the previous and the
    /// target layout while a transition is in flight.
    pub fn positions_at(&self, now: f64) -> Vec<[f32; 2]> {
        match &self.transition {
            Some(tr) => {
                let t = ((now - tr.started_at) / tr.duration_s).clamp(0.0, 1.0) as f32;
                let t = ease(t);
                tr.from
                    .iter()
                    .zip(&self.primary.positions)
                    .map(|(a, b)| [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t])
                    .collect()
            }
            None => self.primary.positions.clone(),
        }
    }

    /// Displayed positions of the highlighted subsequence; rings track the
    /// points they mark through a relayout animation.
    pub fn highlight_positions_at(&self, now: f64) -> Vec<[f32; 2]> {
        let displayed = self.positions_at(now);
        self.highlight
            .indices
            .iter()
            .filter_map(|&i| displayed.get(i).copied())
            .collect()
    }

    pub fn animating(&self, now: f64) -> bool {
        self.transition
            .as_ref()
            .is_some_and(|tr| now - tr.started_at < tr.duration_s)
    }

    /// Nearest visible point within `max_dist` world units of `world`.
    pub fn hit_test(&self, world: [f32; 2], max_dist: f32, now: f64) -> Option<usize> {
        let displayed = self.positions_at(now);
        let mut best = None;
        let mut best_d2 = max_dist * max_dist;
        for (i, pos) in displayed.iter().enumerate() {
            if self.primary.opacities[i] <= 0.0 {
                continue;
            }
            let dx = pos[0] - world[0];
            let dy = pos[1] - world[1];
            let d2 = dx * dx + dy * dy;
            if d2 <= best_d2 {
                best_d2 = d2;
                best = Some(i);
            }
        }
        best
    }

    /// Bounding box of the target layout, for camera fitting.
    pub fn bbox(&self) -> Option<[f32; 4]> {
        if self.primary.positions.is_empty() {
            return None;
        }
        let mut bbox = [
            f32::INFINITY,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::NEG_INFINITY,
        ];
        for p in &self.primary.positions {
            bbox[0] = bbox[0].min(p[0]);
            bbox[1] = bbox[1].min(p[1]);
            bbox[2] = bbox[2].max(p[0]);
            bbox[3] = bbox[3].max(p[1]);
        }
        Some(bbox)
    }
}

fn ease(t: f32) -> f32 {
    let x = t.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(names: &[&str], positions: &[[f32; 2]]) -> PlotUpdate {
        PlotUpdate {
            countries: names.iter().map(|s| s.to_string()).collect(),
            positions: positions.to_vec(),
            colors: vec![Color32::RED; names.len()],
        }
    }

    fn three_point_state() -> PlotState {
        PlotState::build(update(
            &["Norway", "Chile", "Japan"],
            &[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        ))
    }

    #[test]
    fn empty_state_hides_everything_and_sets_the_title() {
        let mut plot = three_point_state();
        plot.refresh_highlight(&selection_of(&["Chile"]));
        plot.set_empty_state(EMPTY_SELECTION_TITLE);

        assert!(plot.primary.opacities.iter().all(|&o| o == 0.0));
        assert_eq!(plot.highlight.opacity, 0.0);
        assert!(!plot.display_names);
        assert_eq!(plot.title, EMPTY_SELECTION_TITLE);
        assert!(!plot.animating(0.0));
    }

    #[test]
    fn apply_resets_the_error_styling() {
        let mut plot = three_point_state();
        plot.set_empty_state(EMPTY_SELECTION_TITLE);

        plot.apply(
            update(&["Norway", "Chile"], &[[2.0, 2.0], [3.0, 3.0]]),
            &SelectionSet::new(),
            10.0,
        );
        assert!(plot.primary.opacities.iter().all(|&o| o == 1.0));
        assert!(plot.title.is_empty());
        assert!(plot.display_names);
        assert_eq!(plot.primary.countries.len(), 2);
    }

    #[test]
    fn relayout_animates_from_displayed_to_target() {
        let mut plot = three_point_state();
        plot.apply(
            update(
                &["Norway", "Chile", "Japan"],
                &[[10.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            ),
            &SelectionSet::new(),
            100.0,
        );

        let start = plot.positions_at(100.0);
        assert_eq!(start[0], [0.0, 0.0]);

        let mid = plot.positions_at(100.0 + ANIMATION_MS / 2000.0);
        assert!(mid[0][0] > 0.0 && mid[0][0] < 10.0);
        assert!(plot.animating(100.0 + ANIMATION_MS / 2000.0));

        let done = plot.positions_at(100.0 + ANIMATION_MS / 1000.0);
        assert_eq!(done[0], [10.0, 0.0]);
        assert!(!plot.animating(100.0 + ANIMATION_MS / 1000.0));
    }

    #[test]
    fn new_countries_appear_at_their_target() {
        let mut plot = three_point_state();
        plot.apply(
            update(&["Norway", "Iceland"], &[[0.0, 0.0], [5.0, 5.0]]),
            &SelectionSet::new(),
            50.0,
        );
        let displayed = plot.positions_at(50.0);
        assert_eq!(displayed[1], [5.0, 5.0]);
    }

    fn selection_of(names: &[&str]) -> SelectionSet {
        let mut sel = SelectionSet::new();
        for n in names {
            sel.toggle(n);
        }
        sel
    }

    #[test]
    fn highlight_is_the_selected_subsequence() {
        let mut plot = three_point_state();
        plot.refresh_highlight(&selection_of(&["Japan", "Norway"]));
        assert_eq!(plot.highlight.indices, vec![2, 0]);
        assert_eq!(plot.highlight.positions, vec![[0.0, 1.0], [0.0, 0.0]]);
        assert_eq!(plot.highlight.opacity, 1.0);
    }

    #[test]
    fn phantom_selections_are_filtered_silently() {
        let mut plot = three_point_state();
        plot.refresh_highlight(&selection_of(&["Atlantis", "Chile"]));
        assert_eq!(plot.highlight.indices, vec![1]);
    }

    #[test]
    fn selection_survives_a_relayout_that_drops_a_country() {
        let mut plot = three_point_state();
        let sel = selection_of(&["Japan", "Chile"]);
        plot.refresh_highlight(&sel);
        assert_eq!(plot.highlight.indices.len(), 2);

        // Japan drops out of the new layout; its selection stays, just
        // without a ring.
        plot.apply(
            update(&["Norway", "Chile"], &[[0.0, 0.0], [1.0, 1.0]]),
            &sel,
            0.0,
        );
        assert_eq!(plot.highlight.indices, vec![1]);
        assert!(sel.contains("Japan"));
    }

    #[test]
    fn toggle_labels_flips_the_flag() {
        let mut plot = three_point_state();
        assert!(plot.display_names);
        plot.toggle_labels();
        assert!(!plot.display_names);
        plot.toggle_labels();
        assert!(plot.display_names);
    }

    #[test]
    fn hit_test_ignores_hidden_points_and_far_clicks() {
        let mut plot = three_point_state();
        assert_eq!(plot.hit_test([0.05, 0.0], 0.2, 0.0), Some(0));
        assert_eq!(plot.hit_test([5.0, 5.0], 0.2, 0.0), None);

        plot.set_empty_state(EMPTY_SELECTION_TITLE);
        assert_eq!(plot.hit_test([0.05, 0.0], 0.2, 0.0), None);
    }

    #[test]
    fn bbox_covers_all_targets() {
        let plot = three_point_state();
        assert_eq!(plot.bbox(), Some([0.0, 0.0, 1.0, 1.0]));
    }
}
