use sf_optimizer::*;
use sf_types::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("StageForge seed layout example");

    let model = JumpModel::default();
    println!(
        "Jump model: height {:.0}px, max distance {:.0}px, safe distance {:.0}px",
        model.max_jump_height, model.max_jump_distance, model.safe_jump_distance
    );

    let optimizer = StageOptimizer::new(StageConfig::default())?;
    let seed = optimizer.initial_parameters();
    println!("Seed vector has {} parameters", seed.len());

    let (level, breakdown) = optimizer.objective().evaluate(&seed)?;
    for p in level.static_platforms() {
        println!("  static x={:.0}-{:.0} y={:.0}", p.x1, p.x2, p.y1);
    }
    for p in &level.moving_platforms {
        println!("  moving x={:.0}->{:.0} y={:.0} speed={}", p.start_x, p.end_x, p.y1, p.speed);
    }
    println!(
        "Seed score {:.4} (clearability {}, educational {}, variety {:.4})",
        breakdown.total, breakdown.clearability, breakdown.educational, breakdown.variety
    );

    // Every adjacent pair in traversal order, graded by the jump model.
    let ledges: Vec<Ledge> = level.ledges().collect();
    for pair in ledges.windows(2) {
        let distance = model.required_jump_distance(pair[0].x2, pair[0].y, pair[1].x1, pair[1].y);
        println!("  jump {:.0} -> {:.0}: {:.1}px {:?}", pair[0].x2, pair[1].x1, distance, model.classify(distance));
    }

    let result = optimizer.optimize()?;
    println!("Optimized score {:.4}: {}", result.score, result.message);

    Ok(())
}
