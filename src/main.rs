use clap::Parser;
use rand::SeedableRng;
use roachmask::config::{Color, ConfigUpdate, SimulationConfig};
use roachmask::constants::{AGENT_COUNT_STEP, AGENT_SIZE_STEP, WANDER_STEP, WINDOW_HEIGHT, WINDOW_WIDTH};
use roachmask::error::AppError;
use roachmask::headless::HeadlessDriver;
use roachmask::mask::{Mask, MaskSlot};
use roachmask::mask_feed::{FeedPreset, MaskFeed};
use roachmask::render_loop::RenderLoop;
use roachmask::renderer::Renderer;
use roachmask::simulation::SimRng;
use std::{path::PathBuf, sync::Arc, thread, time::Duration, time::Instant};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

// --- Command Line ---

#[derive(Parser, Debug)]
#[command(about = "Cockroach agents steering around a binary obstacle mask")]
struct Args {
    /// Static mask image shown when no feed is active
    mask: Option<PathBuf>,

    /// Run without a window for N seconds (5 if omitted)
    #[arg(
        long,
        value_name = "SECS",
        num_args = 0..=1,
        default_missing_value = "5",
        value_parser = parse_secs
    )]
    headless: Option<f64>,

    /// Background color as #rrggbb or #rgb
    #[arg(long, value_name = "COLOR")]
    background: Option<Color>,
}

fn parse_secs(text: &str) -> Result<f64, String> {
    let secs: f64 = text
        .parse()
        .map_err(|_| format!("'{}' is not a number", text))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(format!("duration must be positive, got {}", text))
    }
}

// --- Mask Source Switching ---

/// Stops the current feed (if any) and starts `preset`. With no preset the
/// static mask is restored, or the slot is emptied.
fn switch_feed(
    feed: &mut Option<MaskFeed>,
    preset: Option<FeedPreset>,
    slot: &MaskSlot,
    static_mask: Option<&Mask>,
) {
    if feed.as_ref().map(MaskFeed::preset) == preset {
        return;
    }
    // Dropping joins the producer, so it cannot overwrite what follows.
    feed.take();
    match preset {
        Some(preset) => *feed = Some(MaskFeed::spawn(preset, slot.clone())),
        None => match static_mask {
            Some(mask) => slot.publish(mask.clone()),
            None => slot.clear(),
        },
    }
}

/// Digits 1-4 pick a feed preset, 0 turns the feed off.
fn feed_for_key(code: KeyCode) -> Option<FeedPreset> {
    let index = match code {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        _ => return None,
    };
    Some(FeedPreset::ALL[index])
}

fn run_headless(
    mut render_loop: RenderLoop,
    secs: f64,
    static_mask: Option<Mask>,
) -> Result<(), AppError> {
    let slot = render_loop.mask_slot().clone();
    let mut feed = None;
    if static_mask.is_none() {
        switch_feed(&mut feed, Some(FeedPreset::MaskStream), &slot, None);
    }

    render_loop.set_running(true);
    let driver = HeadlessDriver::default();
    let token = driver.cancel_token();
    let timer = thread::spawn(move || {
        thread::sleep(Duration::from_secs_f64(secs));
        token.cancel();
    });

    log::info!("Running headless for {:.1}s", secs);
    let summary = driver.run(&mut render_loop, None);
    if timer.join().is_err() {
        log::warn!("Headless timer thread panicked");
    }
    drop(feed);

    log::info!(
        "Ticks: {}, physics steps: {}, last FPS: {:.0}",
        summary.ticks,
        summary.advanced_ticks,
        summary.last_fps
    );
    Ok(())
}

// --- Main Function ---
fn main() -> Result<(), AppError> {
    env_logger::init();
    let args = Args::parse();

    let mut config = SimulationConfig::default();
    if let Some(color) = args.background {
        log::info!("Background color {}", color.to_hex());
        config.background_color = color;
    }

    let static_mask = match &args.mask {
        Some(path) => {
            let mask = Mask::from_image_path(path)?;
            log::info!(
                "Loaded mask {} ({}x{})",
                path.display(),
                mask.width(),
                mask.height()
            );
            Some(mask)
        }
        None => None,
    };

    let masks = MaskSlot::new();
    if let Some(mask) = &static_mask {
        masks.publish(mask.clone());
    }

    if let Some(secs) = args.headless {
        let render_loop = RenderLoop::new(
            config,
            WINDOW_WIDTH,
            WINDOW_HEIGHT,
            SimRng::from_entropy(),
            masks,
        );
        return run_headless(render_loop, secs, static_mask);
    }

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Roachmask")
            .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
            .build(&event_loop)?,
    );
    let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;
    let mut render_loop = RenderLoop::new(
        config,
        renderer.size.width,
        renderer.size.height,
        SimRng::from_entropy(),
        masks.clone(),
    );
    let mut feed: Option<MaskFeed> = None;

    event_loop.run(move |event, elwt: &EventLoopWindowTarget<()>| {
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::AboutToWait => window.request_redraw(),
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    feed.take();
                    elwt.exit();
                }
                WindowEvent::Resized(physical_size) => {
                    renderer.resize(physical_size);
                    render_loop.resize_canvas(physical_size.width, physical_size.height);
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let new_inner_size = window.inner_size();
                    renderer.resize(new_inner_size);
                    render_loop.resize_canvas(new_inner_size.width, new_inner_size.height);
                }
                WindowEvent::KeyboardInput {
                    event: key_event, ..
                } => {
                    if key_event.state != ElementState::Pressed || key_event.repeat {
                        return;
                    }
                    let PhysicalKey::Code(code) = key_event.physical_key else {
                        return;
                    };
                    let config = render_loop.config().clone();
                    let mut update = ConfigUpdate::default();
                    match code {
                        KeyCode::Space => render_loop.toggle_running(),
                        KeyCode::KeyM => {
                            update.show_mask_overlay = Some(!config.show_mask_overlay)
                        }
                        KeyCode::KeyD => update.dark_palette = Some(!config.dark_palette),
                        KeyCode::KeyB => {
                            update.background_color = Some(config.next_background_preset())
                        }
                        KeyCode::KeyR => update = ConfigUpdate::reset_defaults(),
                        KeyCode::ArrowUp => {
                            update.agent_count = Some(config.agent_count + AGENT_COUNT_STEP)
                        }
                        KeyCode::ArrowDown => {
                            update.agent_count =
                                Some(config.agent_count.saturating_sub(AGENT_COUNT_STEP))
                        }
                        KeyCode::BracketRight => {
                            update.agent_size = Some(config.agent_size + AGENT_SIZE_STEP)
                        }
                        KeyCode::BracketLeft => {
                            update.agent_size = Some(config.agent_size - AGENT_SIZE_STEP)
                        }
                        KeyCode::Equal | KeyCode::NumpadAdd => {
                            update.wander_amount = Some(config.wander_amount + WANDER_STEP)
                        }
                        KeyCode::Minus | KeyCode::NumpadSubtract => {
                            update.wander_amount = Some(config.wander_amount - WANDER_STEP)
                        }
                        KeyCode::Digit0
                        | KeyCode::Digit1
                        | KeyCode::Digit2
                        | KeyCode::Digit3
                        | KeyCode::Digit4 => switch_feed(
                            &mut feed,
                            feed_for_key(code),
                            &masks,
                            static_mask.as_ref(),
                        ),
                        KeyCode::Escape => {
                            feed.take();
                            elwt.exit();
                        }
                        _ => {}
                    }
                    if update != ConfigUpdate::default() {
                        render_loop.set_config(&update);
                    }
                }
                WindowEvent::RedrawRequested => {
                    render_loop.tick(Instant::now());
                    match renderer.render(render_loop.canvas()) {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            renderer.reconfigure()
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("WGPU Error: OutOfMemory");
                            feed.take();
                            elwt.exit();
                        }
                        Err(e) => log::warn!("WGPU Error: {:?}", e),
                    }

                    let paused_text = if render_loop.is_running() {
                        ""
                    } else {
                        " [PAUSED]"
                    };
                    let feed_text = feed
                        .as_ref()
                        .map(|f| format!(" - Feed: {}", f.preset().name()))
                        .unwrap_or_default();
                    window.set_title(&format!(
                        "Roachmask - Agents: {} - FPS: {:.0}{}{}",
                        render_loop.population().len(),
                        render_loop.fps(),
                        feed_text,
                        paused_text
                    ));
                }
                _ => {}
            },
            _ => {}
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_flag_defaults_and_validates() {
        let args = Args::try_parse_from(["roachmask", "--headless"]).unwrap();
        assert_eq!(args.headless, Some(5.0));
        assert!(args.mask.is_none());

        let args = Args::try_parse_from(["roachmask", "--headless", "2.5", "mask.png"]).unwrap();
        assert_eq!(args.headless, Some(2.5));
        assert_eq!(args.mask, Some(PathBuf::from("mask.png")));

        assert!(Args::try_parse_from(["roachmask", "--headless", "-3"]).is_err());
        assert!(Args::try_parse_from(["roachmask", "--headless", "0"]).is_err());
        assert!(Args::try_parse_from(["roachmask", "--headless", "inf"]).is_err());
        assert!(Args::try_parse_from(["roachmask", "a.png", "b.png"]).is_err());
    }

    #[test]
    fn background_parses_hex() {
        let args = Args::try_parse_from(["roachmask", "--background", "#f5f5dc"]).unwrap();
        assert_eq!(args.background, Some(Color::rgb(0xf5, 0xf5, 0xdc)));
        assert!(Args::try_parse_from(["roachmask", "--background", "beige"]).is_err());
    }
}
