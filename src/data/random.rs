//! Synthetic operational telemetry for random mode.
//!
//! Ranges are hand-picked to look plausible on the dashboard; nothing here
//! models the fab. The only structural guarantees are the derived ones:
//! OEE is the product of its three component ratios, and the lots split
//! reconstructs the WIP size.

use rand::Rng;
use rand::rngs::StdRng;

/// One tick's synthesized figures.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomMetrics {
    /// Availability ratio, 0.70..0.98, 3 decimals.
    pub availability: f64,
    /// Performance ratio, 0.80..0.98, 3 decimals.
    pub performance: f64,
    /// Quality ratio, 0.92..0.995, 3 decimals.
    pub quality: f64,
    /// Composite efficiency percentage: availability * performance * quality.
    pub oee_pct: f64,

    pub wip_size: u32,
    pub wip_min: u32,
    pub wip_max: u32,
    pub wip_add: u32,

    pub tool_top: u32,
    pub tool_bottom: u32,
    pub active_tools: u32,
    pub active_tools_pct: f64,

    pub lots_idle: u32,
    pub lots_queued: u32,
    pub lots_in_prod: u32,

    pub started: u32,
    pub exited: u32,
    /// Weekly moves-over-inventory average.
    pub miw: f64,
    /// Inspection moves-over-inventory.
    pub mii: f64,
    /// Exit/start ratio, clamped to [0, 2].
    pub mir: f64,

    pub capacity: f64,
    pub capacity2: f64,
    pub target: f64,

    pub orders_done: u32,
    pub avg_eta_hours: u32,
}

impl RandomMetrics {
    /// Draw one tick's bundle.
    pub fn sample(rng: &mut StdRng) -> Self {
        let availability = r_between(rng, 0.70, 0.98, 3);
        let performance = r_between(rng, 0.80, 0.98, 3);
        let quality = r_between(rng, 0.92, 0.995, 3);
        let oee_pct = round_to(availability * performance * quality * 100.0, 2);

        let wip_size = r_int(rng, 40, 140);
        let wip_min = r_int(rng, 20, 25u32.max((wip_size as f64 * 0.3).floor() as u32));
        let wip_max = r_int(
            rng,
            (wip_min + 5).max((wip_size as f64 * 0.8).floor() as u32),
            (wip_min + 10).max(wip_size + 40),
        );
        let wip_add = r_int(rng, 0, 20);

        let tool_top = r_int(rng, 0, 50);
        let tool_bottom = r_int(rng, 0, 50);
        let active_tools = tool_top + tool_bottom;
        let active_tools_pct = clamp(active_tools as f64 / 100.0, 0.0, 1.0) * 100.0;

        let lots_idle = (wip_size as f64 * r_between(rng, 0.15, 0.35, 2)).round() as u32;
        let lots_queued = (wip_size as f64 * r_between(rng, 0.10, 0.25, 2)).round() as u32;
        // The draws above cap idle + queued well below the total, so the
        // saturation is only a guard and the three buckets sum to wip_size.
        let lots_in_prod = wip_size.saturating_sub(lots_idle + lots_queued);

        let started = r_int(rng, 10, 60);
        let exited = r_int(rng, 10, 50);
        let miw = r_between(rng, 0.6, 6.3, 2);
        let mii = r_between(rng, 0.05, 7.3, 2);
        let mir = round_to(clamp(exited as f64 / started as f64, 0.0, 2.0), 2);

        let capacity = r_between(rng, 0.0, 40.0, 2);
        let capacity2 = r_between(rng, 0.0, 40.0, 2);
        let target = r_between(rng, 60.0, 120.0, 2);
        let orders_done = r_int(rng, 0, 10);
        let avg_eta_hours = r_int(rng, 5, 24);

        Self {
            availability,
            performance,
            quality,
            oee_pct,
            wip_size,
            wip_min,
            wip_max,
            wip_add,
            tool_top,
            tool_bottom,
            active_tools,
            active_tools_pct,
            lots_idle,
            lots_queued,
            lots_in_prod,
            started,
            exited,
            miw,
            mii,
            mir,
            capacity,
            capacity2,
            target,
            orders_done,
            avg_eta_hours,
        }
    }

    pub fn availability_pct(&self) -> f64 {
        round_to(self.availability * 100.0, 2)
    }

    pub fn performance_pct(&self) -> f64 {
        round_to(self.performance * 100.0, 2)
    }

    pub fn quality_pct(&self) -> f64 {
        round_to(self.quality * 100.0, 2)
    }
}

fn r_between(rng: &mut StdRng, lo: f64, hi: f64, dec: u32) -> f64 {
    round_to(rng.gen_range(lo..hi), dec)
}

/// Inclusive integer draw.
fn r_int(rng: &mut StdRng, lo: u32, hi: u32) -> u32 {
    rng.gen_range(lo..=hi)
}

fn round_to(v: f64, dec: u32) -> f64 {
    let p = 10f64.powi(dec as i32);
    (v * p).round() / p
}

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}
