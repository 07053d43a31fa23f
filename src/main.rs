use std::sync::{Arc, Mutex};

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use rand::Rng;
use ripple2d::{
    ClearRippleForce, RippleBrushStroke, RippleConfig, RipplePlugin, RippleSimulation,
    RippleSimulationSet,
};

const RESOLUTION: u32 = 256;
const DISPLAY_SIZE: f32 = 768.0;

/// Camera used to turn the cursor into simulation UV
#[derive(Component)]
struct RippleCamera;

#[derive(Component)]
struct WaterSurface;

/// Mouse brush settings
#[derive(Resource)]
struct DebugBrush {
    radius: f32,
    strength: f32,
    falloff: f32,
    clear_each_frame: bool,
}

impl Default for DebugBrush {
    fn default() -> Self {
        Self {
            radius: 0.03,
            strength: 2.0,
            falloff: 2.0,
            clear_each_frame: true,
        }
    }
}

#[derive(Resource)]
struct Rain {
    enabled: bool,
    timer: Timer,
}

/// Published result shared between the simulation and the shading system
#[derive(Resource, Clone, Default)]
struct PublishedSurface(Arc<Mutex<Vec<Vec4>>>);

#[derive(Resource)]
struct SurfaceImage(Handle<Image>);

fn setup(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    mut simulation: ResMut<RippleSimulation>,
    published: Res<PublishedSurface>,
) {
    commands.spawn((Camera2d, RippleCamera));

    let image = Image::new_fill(
        Extent3d {
            width: RESOLUTION,
            height: RESOLUTION,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    let handle = images.add(image);

    commands.spawn((
        Sprite {
            image: handle.clone(),
            custom_size: Some(Vec2::splat(DISPLAY_SIZE)),
            ..default()
        },
        WaterSurface,
    ));
    commands.insert_resource(SurfaceImage(handle));

    simulation.set_output_target(published.0.clone());
}

fn mouse_brush(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    cameras: Query<(&Camera, &GlobalTransform), With<RippleCamera>>,
    brush: Res<DebugBrush>,
    mut clears: MessageWriter<ClearRippleForce>,
    mut strokes: MessageWriter<RippleBrushStroke>,
) {
    if brush.clear_each_frame {
        clears.write(ClearRippleForce);
    }

    let strength = if buttons.pressed(MouseButton::Left) {
        brush.strength
    } else if buttons.pressed(MouseButton::Right) {
        -brush.strength
    } else {
        return;
    };

    let Ok(window) = windows.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok(world) = camera.viewport_to_world_2d(camera_transform, cursor) else {
        return;
    };

    // Image row 0 is drawn at the top of the sprite
    let half = DISPLAY_SIZE * 0.5;
    let uv = Vec2::new(world.x + half, half - world.y) / DISPLAY_SIZE;
    if uv.cmplt(Vec2::ZERO).any() || uv.cmpgt(Vec2::ONE).any() {
        return;
    }

    strokes.write(RippleBrushStroke {
        uv,
        radius: brush.radius,
        strength,
        falloff: brush.falloff,
    });
}

fn toggle_rain(keys: Res<ButtonInput<KeyCode>>, mut rain: ResMut<Rain>) {
    if keys.just_pressed(KeyCode::KeyR) {
        rain.enabled = !rain.enabled;
        info!("Rain {}", if rain.enabled { "on" } else { "off" });
    }
}

fn rain_drops(
    time: Res<Time>,
    mut rain: ResMut<Rain>,
    mut strokes: MessageWriter<RippleBrushStroke>,
) {
    if !rain.enabled || !rain.timer.tick(time.delta()).just_finished() {
        return;
    }

    let mut rng = rand::rng();
    for _ in 0..rng.random_range(1..4) {
        strokes.write(RippleBrushStroke {
            uv: Vec2::new(rng.random::<f32>(), rng.random::<f32>()),
            radius: rng.random_range(0.008..0.02),
            strength: rng.random_range(1.0..4.0),
            falloff: 2.0,
        });
    }
}

fn shade_surface(
    published: Res<PublishedSurface>,
    surface: Res<SurfaceImage>,
    mut images: ResMut<Assets<Image>>,
) {
    let Ok(result) = published.0.lock() else {
        return;
    };
    if result.is_empty() {
        return;
    }
    let Some(image) = images.get_mut(&surface.0) else {
        return;
    };
    let Some(data) = image.data.as_mut() else {
        return;
    };

    let light = Vec3::new(0.4, 0.8, 0.3).normalize();
    for (texel, pixel) in result.iter().zip(data.chunks_exact_mut(4)) {
        let normal = texel.truncate();
        let diffuse = normal.dot(light).clamp(0.0, 1.0);
        let crest = (texel.w * 4.0).clamp(0.0, 0.3);
        let color = Vec3::new(0.05, 0.25, 0.45) * (0.4 + 0.6 * diffuse) + Vec3::splat(crest);
        pixel[0] = (color.x.clamp(0.0, 1.0) * 255.0) as u8;
        pixel[1] = (color.y.clamp(0.0, 1.0) * 255.0) as u8;
        pixel[2] = (color.z.clamp(0.0, 1.0) * 255.0) as u8;
        pixel[3] = 255;
    }
}

fn main() {
    let config = RippleConfig::default().with_resolution(RESOLUTION, RESOLUTION);

    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(RipplePlugin { config })
        .init_resource::<DebugBrush>()
        .init_resource::<PublishedSurface>()
        .insert_resource(Rain {
            enabled: false,
            timer: Timer::from_seconds(0.08, TimerMode::Repeating),
        })
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (toggle_rain, mouse_brush, rain_drops)
                .chain()
                .before(RippleSimulationSet),
        )
        .add_systems(Update, shade_surface.after(RippleSimulationSet))
        .run();
}
