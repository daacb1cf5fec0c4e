extern crate image;

use crate::display::{Color, Panel};
use crate::result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshCycle {
    // White-out commit ahead of the frame, to purge ghosting.
    FullClear,
    Partial,
}

#[derive(Debug)]
pub struct RefreshController {
    refresh_count: u64,
    full_clear_interval: u32,
}

impl RefreshController {
    pub fn new(full_clear_interval: u32) -> RefreshController {
        if full_clear_interval == 0 {
            warn!("full clear interval of 0 requested, clearing on every update");
        }
        return RefreshController {
            refresh_count: 0,
            full_clear_interval: std::cmp::max(1, full_clear_interval),
        };
    }

    pub fn refresh_count(&self) -> u64 {
        return self.refresh_count;
    }

    pub fn full_clear_interval(&self) -> u32 {
        return self.full_clear_interval;
    }

    // Counts one update and decides its cycle. Updates 1, 1 + n, 1 + 2n, ...
    // get a full clear.
    pub fn next_cycle(&mut self) -> RefreshCycle {
        self.refresh_count += 1;
        if (self.refresh_count - 1) % self.full_clear_interval as u64 == 0 {
            return RefreshCycle::FullClear;
        }
        return RefreshCycle::Partial;
    }

    pub fn commit<P: Panel + ?Sized>(
        &self,
        cycle: RefreshCycle,
        panel: &mut P,
        frame: &image::GrayImage) -> result::MetroResult<()> {
        if cycle == RefreshCycle::FullClear {
            info!("Full clear on refresh {}", self.refresh_count);
            panel.fill(Color::White)?;
            panel.display()?;
        }

        panel.image(frame)?;
        panel.display()?;
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::{RefreshController, RefreshCycle};
    use crate::display::{PanelCall, RecordingPanel};

    #[test]
    fn full_clear_every_tenth_update() {
        let mut controller = RefreshController::new(10);
        let full: Vec<u64> = (1..=45)
            .filter(|_| controller.next_cycle() == RefreshCycle::FullClear)
            .collect();

        assert_eq!(vec![1, 11, 21, 31, 41], full);
        assert_eq!(45, controller.refresh_count());
    }

    #[test]
    fn interval_is_configurable() {
        let mut controller = RefreshController::new(60);
        let full: Vec<u64> = (1..=130)
            .filter(|_| controller.next_cycle() == RefreshCycle::FullClear)
            .collect();

        assert_eq!(vec![1, 61, 121], full);
    }

    #[test]
    fn interval_of_one_always_clears() {
        for interval in [0, 1].iter() {
            let mut controller = RefreshController::new(*interval);
            assert_eq!(1, controller.full_clear_interval());
            for _ in 0..5 {
                assert_eq!(RefreshCycle::FullClear, controller.next_cycle());
            }
        }
    }

    #[test]
    fn commit_sequences() {
        let controller = RefreshController::new(10);
        let frame = image::GrayImage::new(4, 2);

        let mut panel = RecordingPanel::new(4, 2);
        controller.commit(RefreshCycle::FullClear, &mut panel, &frame).expect("commit");
        assert_eq!(
            vec![PanelCall::FillWhite, PanelCall::Display, PanelCall::Image, PanelCall::Display],
            panel.calls);

        let mut panel = RecordingPanel::new(4, 2);
        controller.commit(RefreshCycle::Partial, &mut panel, &frame).expect("commit");
        assert_eq!(vec![PanelCall::Image, PanelCall::Display], panel.calls);
    }

    #[test]
    fn commit_failure_propagates() {
        let controller = RefreshController::new(10);
        let frame = image::GrayImage::new(4, 2);
        let mut panel = RecordingPanel::new(4, 2);
        panel.fail_on_display = true;

        let err = controller.commit(RefreshCycle::Partial, &mut panel, &frame).expect_err("should fail");
        assert!(err.downcast_ref::<crate::result::PanelError>().is_some());
    }
}
