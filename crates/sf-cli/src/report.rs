//! Console summary of an optimization run.

use tracing::{error, info};

use sf_types::OptimizationResult;

pub fn log_summary(result: &OptimizationResult) {
    if !result.success {
        error!("{}", result.message);
        return;
    }

    info!("Optimization score: {:.2}", result.score);
    info!(
        "Breakdown: clearability {:.1}, educational {:.1}, variety {:.2}",
        result.breakdown.clearability, result.breakdown.educational, result.breakdown.variety
    );
    info!(
        "{} iterations, {} evaluations in {} ms",
        result.iterations,
        result.evaluations,
        result.duration_millis()
    );
    info!(
        "Generated {} fixed platforms and {} moving platforms",
        result.level.static_platforms().count(),
        result.level.moving_platforms.len()
    );

    for (i, p) in result.level.static_platforms().enumerate() {
        info!("  fixed {}: x={:.0}-{:.0}, y={:.0}", i + 1, p.x1, p.x2, p.y1);
    }
    for (i, p) in result.level.moving_platforms.iter().enumerate() {
        info!(
            "  moving {}: x={:.0}->{:.0} (travel {:.0}px), y={:.0}, speed={:.1}",
            i + 1,
            p.start_x,
            p.end_x,
            p.travel(),
            p.y1,
            p.speed
        );
    }
}
