use crate::config::StepConfig;
use crate::renderer::Action;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub indicator: Option<String>,
    pub text: String,
    pub height: f64,
}

impl Step {
    /// A blank or absent indicator marks an intro step, which resets the map.
    pub fn action(&self) -> Action {
        match self.indicator.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Action::ShowIndicator(id.to_string()),
            _ => Action::Reset,
        }
    }
}

impl From<&StepConfig> for Step {
    fn from(cfg: &StepConfig) -> Self {
        Self {
            indicator: cfg.indicator.clone(),
            text: cfg.text.clone(),
            height: cfg.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    Up,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepEnter {
    pub index: usize,
    pub direction: Direction,
    pub action: Action,
}

/// Steps stacked top to bottom; the step under the trigger line is active.
#[derive(Debug, Clone)]
pub struct Scroller {
    steps: Vec<Step>,
    tops: Vec<f64>,
    offset: f64,
    trigger: f64,
    active: Option<usize>,
}

impl Scroller {
    pub fn new(steps: Vec<Step>, offset: f64, viewport_height: f64) -> Self {
        let tops = steps
            .iter()
            .scan(0.0, |acc, step| {
                let top = *acc;
                *acc += step.height;
                Some(top)
            })
            .collect();
        let offset = offset.clamp(0.0, 1.0);
        Self {
            steps,
            tops,
            offset,
            trigger: offset * viewport_height,
            active: None,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Distance from the viewport top to the trigger line.
    pub fn trigger_offset(&self) -> f64 {
        self.trigger
    }

    pub fn step_top(&self, index: usize) -> Option<f64> {
        self.tops.get(index).copied()
    }

    /// Scroll position that puts the trigger line exactly on a step's top.
    pub fn scroll_top_for(&self, index: usize) -> Option<f64> {
        self.step_top(index).map(|top| top - self.trigger)
    }

    /// Scroll position that puts the trigger line in the middle of a step.
    /// Landing well inside the step keeps rounding from slipping the line
    /// back into the previous one.
    pub fn scroll_target_for(&self, index: usize) -> Option<f64> {
        let start = self.scroll_top_for(index)?;
        Some(start + self.steps[index].height / 2.0)
    }

    /// Recomputes the trigger line for a new viewport. Emits nothing; the
    /// active step only changes on the next scroll.
    pub fn resize(&mut self, viewport_height: f64) {
        self.trigger = self.offset * viewport_height;
        debug!("Scroller resized, trigger at {}px", self.trigger);
    }

    /// Moves the viewport and reports the step entered, if any.
    pub fn scroll_to(&mut self, scroll_top: f64) -> Option<StepEnter> {
        let line = scroll_top + self.trigger;
        let index = self.step_at(line)?;
        if self.active == Some(index) {
            return None;
        }

        let direction = match self.active {
            Some(prev) if index < prev => Direction::Up,
            _ => Direction::Down,
        };
        self.active = Some(index);
        debug!("Entered step {} going {:?}", index, direction);

        Some(StepEnter {
            index,
            direction,
            action: self.steps[index].action(),
        })
    }

    fn step_at(&self, y: f64) -> Option<usize> {
        self.tops
            .iter()
            .zip(&self.steps)
            .position(|(&top, step)| y >= top && y < top + step.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(indicator: Option<&str>) -> Step {
        Step {
            indicator: indicator.map(str::to_string),
            text: String::new(),
            height: 500.0,
        }
    }

    fn story() -> Scroller {
        Scroller::new(
            vec![step(None), step(Some("m8_2_parks")), step(Some("m8_3_trails"))],
            0.5,
            800.0,
        )
    }

    #[test]
    fn step_actions() {
        assert_eq!(step(None).action(), Action::Reset);
        assert_eq!(step(Some("  ")).action(), Action::Reset);
        assert_eq!(
            step(Some("m8_2_parks")).action(),
            Action::ShowIndicator("m8_2_parks".to_string())
        );
    }

    #[test]
    fn layout_is_cumulative() {
        let s = story();
        assert_eq!(s.step_top(0), Some(0.0));
        assert_eq!(s.step_top(2), Some(1000.0));
        assert_eq!(s.step_top(3), None);
        assert_eq!(s.trigger_offset(), 400.0);
        assert_eq!(s.scroll_top_for(1), Some(100.0));
    }

    #[test]
    fn entering_steps_down_and_back_up() {
        let mut s = story();
        let first = s.scroll_to(-400.0).unwrap();
        assert_eq!((first.index, first.direction), (0, Direction::Down));
        assert_eq!(first.action, Action::Reset);

        // still inside step 0
        assert_eq!(s.scroll_to(0.0), None);

        let second = s.scroll_to(150.0).unwrap();
        assert_eq!((second.index, second.direction), (1, Direction::Down));
        assert_eq!(second.action, Action::ShowIndicator("m8_2_parks".into()));

        let third = s.scroll_to(700.0).unwrap();
        assert_eq!(third.index, 2);

        let back = s.scroll_to(0.0).unwrap();
        assert_eq!((back.index, back.direction), (0, Direction::Up));
        assert_eq!(back.action, Action::Reset);
    }

    #[test]
    fn positions_outside_steps_keep_the_active_step() {
        let mut s = story();
        assert!(s.scroll_to(-1000.0).is_none());
        assert_eq!(s.active(), None);
        s.scroll_to(150.0).unwrap();
        assert!(s.scroll_to(5000.0).is_none());
        assert_eq!(s.active(), Some(1));
    }

    #[test]
    fn resize_before_any_scroll_changes_nothing_visible() {
        let mut s = story();
        s.resize(1200.0);
        assert_eq!(s.trigger_offset(), 600.0);
        assert_eq!(s.active(), None);

        // the next scroll uses the new trigger line
        let enter = s.scroll_to(0.0).unwrap();
        assert_eq!(enter.index, 1);
    }

    #[test]
    fn scroll_target_lands_inside_fractional_steps() {
        for offset in [0.1, 0.3, 0.5, 0.7] {
            for viewport in [733.0, 777.7, 901.3] {
                for height in [333.3, 450.7, 517.1] {
                    let steps = (0..12).map(|i| Step {
                        height,
                        ..step(if i % 2 == 0 { None } else { Some("m8_2_parks") })
                    });
                    let mut s = Scroller::new(steps.collect(), offset, viewport);
                    for i in 0..12 {
                        let target = s.scroll_target_for(i).unwrap();
                        let enter = s.scroll_to(target);
                        assert_eq!(
                            enter.map(|e| e.index),
                            Some(i),
                            "offset {offset} viewport {viewport} height {height}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn empty_story_never_fires() {
        let mut s = Scroller::new(Vec::new(), 0.5, 800.0);
        s.resize(100.0);
        assert!(s.scroll_to(0.0).is_none());
        assert!(s.scroll_top_for(0).is_none());
        assert!(s.scroll_target_for(0).is_none());
    }
}
