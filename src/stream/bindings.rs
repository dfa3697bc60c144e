//! Per-tick value sinks for the random telemetry stream.
//!
//! A `Bindings` bundle is a set of optional setter closures, one per
//! dashboard figure. Callers fill in only the setters they care about; any
//! missing setter is silently skipped. This mirrors the view-model surface
//! the random stream was designed to drive.

use crate::data::RandomMetrics;
use crate::domain::FormattedStamp;

/// Sink for a formatted text value (date, time).
pub type TextSetter = Box<dyn FnMut(&str) + Send>;
/// Sink for a numeric value.
pub type NumSetter = Box<dyn FnMut(f64) + Send>;

/// Optional setters invoked once per random-stream tick.
#[derive(Default)]
pub struct Bindings {
    pub set_date: Option<TextSetter>,
    pub set_time: Option<TextSetter>,

    pub set_availability: Option<NumSetter>,
    pub set_performance: Option<NumSetter>,
    pub set_quality: Option<NumSetter>,
    pub set_oee: Option<NumSetter>,
    pub set_pct_oee: Option<NumSetter>,

    pub set_wip_size: Option<NumSetter>,
    pub set_wip_min: Option<NumSetter>,
    pub set_wip_max: Option<NumSetter>,
    pub set_wip_lots: Option<NumSetter>,
    pub set_wip_lots_add: Option<NumSetter>,

    pub set_capacity: Option<NumSetter>,
    pub set_capacity2: Option<NumSetter>,
    pub set_target: Option<NumSetter>,

    pub set_weekly_avg: Option<NumSetter>,
    pub set_inspect: Option<NumSetter>,
    pub set_ratio: Option<NumSetter>,

    pub set_tool_top: Option<NumSetter>,
    pub set_tool_bottom: Option<NumSetter>,
    pub set_active_tools: Option<NumSetter>,
    pub set_active_tools_percent: Option<NumSetter>,

    pub set_lots_idle: Option<NumSetter>,
    pub set_lots_in_queue: Option<NumSetter>,
    pub set_lots_in_prod: Option<NumSetter>,

    pub set_orders_done: Option<NumSetter>,
    pub set_avg_eta: Option<NumSetter>,
    pub set_total_lots: Option<NumSetter>,
}

impl Bindings {
    /// Push a freshly sampled tick into every bound setter.
    pub(crate) fn push(&mut self, stamp: &FormattedStamp, m: &RandomMetrics) {
        fn num(slot: &mut Option<NumSetter>, v: f64) {
            if let Some(set) = slot {
                set(v);
            }
        }

        if let Some(set) = &mut self.set_date {
            set(&stamp.date);
        }
        if let Some(set) = &mut self.set_time {
            set(&stamp.time);
        }

        num(&mut self.set_availability, m.availability_pct());
        num(&mut self.set_performance, m.performance_pct());
        num(&mut self.set_quality, m.quality_pct());
        num(&mut self.set_oee, m.oee_pct);
        num(&mut self.set_pct_oee, m.oee_pct);

        num(&mut self.set_wip_size, f64::from(m.wip_size));
        num(&mut self.set_wip_min, f64::from(m.wip_min));
        num(&mut self.set_wip_max, f64::from(m.wip_max));
        num(&mut self.set_wip_lots, f64::from(m.wip_size));
        num(&mut self.set_wip_lots_add, f64::from(m.wip_add));

        num(&mut self.set_capacity, m.capacity);
        num(&mut self.set_capacity2, m.capacity2);
        num(&mut self.set_target, m.target);

        num(&mut self.set_weekly_avg, m.miw);
        num(&mut self.set_inspect, m.mii);
        num(&mut self.set_ratio, m.mir);

        num(&mut self.set_tool_top, f64::from(m.tool_top));
        num(&mut self.set_tool_bottom, f64::from(m.tool_bottom));
        num(&mut self.set_active_tools, f64::from(m.active_tools));
        num(&mut self.set_active_tools_percent, m.active_tools_pct);

        num(&mut self.set_lots_idle, f64::from(m.lots_idle));
        num(&mut self.set_lots_in_queue, f64::from(m.lots_queued));
        num(&mut self.set_lots_in_prod, f64::from(m.lots_in_prod));

        num(&mut self.set_orders_done, f64::from(m.orders_done));
        num(&mut self.set_avg_eta, f64::from(m.avg_eta_hours));
        num(&mut self.set_total_lots, f64::from(m.wip_size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};

    fn stamp() -> FormattedStamp {
        FormattedStamp {
            date: "7/1/2023".to_string(),
            time: "09:30 AM".to_string(),
        }
    }

    #[test]
    fn default_bindings_accept_a_push() {
        let mut rng = StdRng::seed_from_u64(1);
        let metrics = RandomMetrics::sample(&mut rng);
        Bindings::default().push(&stamp(), &metrics);
    }

    #[test]
    fn bound_setters_receive_the_tick() {
        let date = Arc::new(Mutex::new(String::new()));
        let oee = Arc::new(Mutex::new(0.0));

        let mut bindings = Bindings::default();
        {
            let date = date.clone();
            bindings.set_date = Some(Box::new(move |d| {
                *date.lock().unwrap() = d.to_string();
            }));
        }
        {
            let oee = oee.clone();
            bindings.set_oee = Some(Box::new(move |v| {
                *oee.lock().unwrap() = v;
            }));
        }

        let mut rng = StdRng::seed_from_u64(7);
        let metrics = RandomMetrics::sample(&mut rng);
        bindings.push(&stamp(), &metrics);

        assert_eq!(*date.lock().unwrap(), "7/1/2023");
        assert_eq!(*oee.lock().unwrap(), metrics.oee_pct);
    }

    #[test]
    fn lot_breakdown_setters_sum_to_wip() {
        let total = Arc::new(Mutex::new(0.0));

        let mut bindings = Bindings::default();
        for slot in [
            &mut bindings.set_lots_idle,
            &mut bindings.set_lots_in_queue,
            &mut bindings.set_lots_in_prod,
        ] {
            let total = total.clone();
            *slot = Some(Box::new(move |v| {
                *total.lock().unwrap() += v;
            }));
        }

        let mut rng = StdRng::seed_from_u64(42);
        let metrics = RandomMetrics::sample(&mut rng);
        bindings.push(&stamp(), &metrics);

        assert_eq!(*total.lock().unwrap(), f64::from(metrics.wip_size));
    }
}
