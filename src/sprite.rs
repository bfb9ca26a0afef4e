// --- File: sprite.rs ---
// Cockroach sprite: body, head, antennae and six legs, drawn in the agent's
// local frame and rotated to its heading. Purely cosmetic.
use crate::canvas::Canvas;
use crate::config::AgentPalette;
use crate::simulation::Agent;
use glam::Vec2;

const WIGGLE_ANGLE: f32 = 0.1;
const LEG_SWING: f32 = 2.0;
const LEG_REACH: f32 = 3.0;

pub fn draw_agent(canvas: &mut Canvas, agent: &Agent, palette: &AgentPalette) {
    let s = agent.size;
    let rotation = agent.angle + agent.wiggle_phase.sin() * WIGGLE_ANGLE;
    let (sin, cos) = rotation.sin_cos();
    let to_canvas = |local: Vec2| {
        agent.position + Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos)
    };

    // --- Body & Head ---
    canvas.fill_ellipse(agent.position, s, s * 0.6, rotation, palette.body);
    canvas.fill_ellipse(
        to_canvas(Vec2::new(s * 0.7, 0.0)),
        s * 0.4,
        s * 0.3,
        rotation,
        palette.head,
    );

    // --- Antennae ---
    for side in [-1.0, 1.0] {
        canvas.draw_line(
            to_canvas(Vec2::new(s * 0.9, side * s * 0.2)),
            to_canvas(Vec2::new(s * 1.2, side * s * 0.4)),
            palette.legs,
        );
    }

    // --- Legs ---
    for i in 0..3 {
        let leg_x = -s * 0.3 + i as f32 * s * 0.3;
        let swing = (agent.wiggle_phase + i as f32).sin() * LEG_SWING;
        for side in [-1.0, 1.0] {
            canvas.draw_line(
                to_canvas(Vec2::new(leg_x, side * s * 0.4)),
                to_canvas(Vec2::new(leg_x - LEG_REACH, side * s * 0.8 + swing)),
                palette.legs,
            );
        }
    }
}


// --- End of File: sprite.rs ---
