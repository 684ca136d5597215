//! Scanline renderer demo
//!
//! Spins a textured, lit mesh in a window.
//!
//! Usage: `scanline-renderer [mesh.obj] [texture.png] [settings.ron]`
//!
//! Keys: I interlace, F filter, W wrap, L lighting, P perspective correction,
//! M mipmaps, C backface culling, S save settings

use std::path::{Path, PathBuf};
use std::rc::Rc;

use macroquad::prelude::{
    clear_background, draw_text, draw_texture_ex, get_frame_time, is_key_pressed, next_frame, screen_height,
    screen_width, vec2, Color, Conf, DrawTextureParams, FilterMode, KeyCode, Texture2D, WHITE,
};
use scanline_renderer::rasterizer::{
    normal_matrix, perspective, rotation, translate, Framebuffer, Mesh, RenderContext, RenderSettings, Texture,
    Vec3, Vec4, Wrap, HEIGHT, WIDTH,
};
use scanline_renderer::VERSION;

const BACKGROUND: Vec4 = Vec4::rgb(0.08, 0.08, 0.1);

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Scanline Renderer v{}", VERSION),
        window_width: WIDTH as i32 * 3,
        window_height: HEIGHT as i32 * 3,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Command line inputs, all optional
struct Args {
    mesh: Option<PathBuf>,
    texture: Option<PathBuf>,
    settings: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1).map(PathBuf::from);
        Self {
            mesh: args.next(),
            texture: args.next(),
            settings: args.next(),
        }
    }
}

fn load_mesh(path: Option<&PathBuf>) -> Mesh {
    match path.map(Mesh::load_obj) {
        Some(Ok(mesh)) => mesh,
        Some(Err(e)) => {
            log::error!("Failed to load mesh: {}, using cube", e);
            Mesh::cube()
        }
        None => Mesh::cube(),
    }
}

fn load_texture(path: Option<&PathBuf>) -> Option<Texture> {
    let loaded = match path.map(Texture::from_file) {
        Some(Ok(texture)) => return Some(texture),
        Some(Err(e)) => Err(e),
        None => Texture::checkerboard(64, 64, 8, Vec4::ONE, Vec4::rgb(0.35, 0.35, 0.45)),
    };
    match loaded {
        Ok(texture) => Some(texture),
        Err(e) => {
            log::error!("Failed to load texture: {}, rendering untextured", e);
            None
        }
    }
}

fn load_settings(path: Option<&PathBuf>) -> RenderSettings {
    match path.map(RenderSettings::load) {
        Some(Ok(settings)) => settings,
        Some(Err(e)) => {
            log::error!("Failed to load settings: {}, using defaults", e);
            RenderSettings::default()
        }
        None => RenderSettings::default(),
    }
}

/// Apply one frame's key presses to the settings
fn handle_keys(settings: &mut RenderSettings, settings_path: &Path) {
    if is_key_pressed(KeyCode::I) {
        settings.interlaced = !settings.interlaced;
        log::info!("Interlaced: {}", settings.interlaced);
    }
    if is_key_pressed(KeyCode::F) {
        settings.sampling.filter = settings.sampling.filter.next();
        log::info!("Filter: {:?}", settings.sampling.filter);
    }
    if is_key_pressed(KeyCode::W) {
        settings.sampling.wrap = match settings.sampling.wrap {
            Wrap::Repeat => Wrap::Clamp,
            Wrap::Clamp => Wrap::Repeat,
        };
        log::info!("Wrap: {:?}", settings.sampling.wrap);
    }
    if is_key_pressed(KeyCode::L) {
        settings.lighting.enabled = !settings.lighting.enabled;
        log::info!("Lighting: {}", settings.lighting.enabled);
    }
    if is_key_pressed(KeyCode::P) {
        settings.perspective_correct = !settings.perspective_correct;
        log::info!("Perspective correct: {}", settings.perspective_correct);
    }
    if is_key_pressed(KeyCode::M) {
        settings.mipmaps = !settings.mipmaps;
        log::info!("Mipmaps: {}", settings.mipmaps);
    }
    if is_key_pressed(KeyCode::C) {
        settings.backface_cull = !settings.backface_cull;
        log::info!("Backface culling: {}", settings.backface_cull);
    }
    if is_key_pressed(KeyCode::S) {
        match settings.save(settings_path) {
            Ok(()) => log::info!("Saved settings to {}", settings_path.display()),
            Err(e) => log::error!("Failed to save settings: {}", e),
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mesh = load_mesh(args.mesh.as_ref());
    let settings_path = args.settings.clone().unwrap_or_else(|| PathBuf::from("settings.ron"));

    let mut fb = Framebuffer::new(WIDTH, HEIGHT);
    let mut ctx = RenderContext::with_settings(WIDTH, HEIGHT, load_settings(args.settings.as_ref()));
    if let Some(texture) = load_texture(args.texture.as_ref()) {
        ctx.bind_texture(Rc::new(texture));
    }

    log::info!(
        "=== Scanline Renderer === {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    let projection = perspective(WIDTH as f32 / HEIGHT as f32, 70.0, 0.1, 100.0);
    let spin_axis = Vec3::new(0.3, 1.0, 0.2).normalize();
    let mut angle = 0.0f32;

    loop {
        handle_keys(ctx.settings_mut(), &settings_path);
        angle = (angle + get_frame_time() * 40.0) % 360.0;

        let model = translate(0.0, 0.0, -4.0) * rotation(angle, spin_axis);
        let normals = normal_matrix(&model);
        let mvp = projection * model;

        ctx.begin_frame();
        if ctx.settings().interlaced {
            // Untouched pixels keep last frame's image
            fb.clear_checkerboard(ctx.parity(), BACKGROUND);
        } else {
            fb.clear(BACKGROUND);
        }
        ctx.draw_mesh(&mut fb, &mesh, &mvp, Some(&normals));

        // Present, scaled to fit the window with the framebuffer's aspect
        clear_background(Color::from_rgba(20, 20, 25, 255));
        let scale = (screen_width() / fb.width as f32).min(screen_height() / fb.height as f32);
        let draw_w = fb.width as f32 * scale;
        let draw_h = fb.height as f32 * scale;
        let draw_x = (screen_width() - draw_w) * 0.5;
        let draw_y = (screen_height() - draw_h) * 0.5;

        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.pixels);
        texture.set_filter(FilterMode::Nearest);
        draw_texture_ex(
            &texture,
            draw_x,
            draw_y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(draw_w, draw_h)),
                ..Default::default()
            },
        );

        let stats = ctx.stats();
        let settings = ctx.settings();
        draw_text(
            &format!(
                "tris {}/{}  culled {}+{}  pixels {}",
                stats.triangles_drawn,
                stats.triangles_submitted,
                stats.culled_facing,
                stats.culled_clipped,
                stats.pixels_written
            ),
            10.0,
            20.0,
            20.0,
            WHITE,
        );
        draw_text(
            &format!(
                "[F] {:?}  [W] {:?}  [M] mip {}  [P] persp {}  [L] light {}  [I] interlace {}  [C] cull {}",
                settings.sampling.filter,
                settings.sampling.wrap,
                settings.mipmaps,
                settings.perspective_correct,
                settings.lighting.enabled,
                settings.interlaced,
                settings.backface_cull
            ),
            10.0,
            40.0,
            16.0,
            WHITE,
        );

        next_frame().await;
    }
}
