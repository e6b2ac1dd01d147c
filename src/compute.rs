use std::num::NonZeroU64;

use crate::config::LifeConfig;
use crate::grid::GridDims;
use crate::kernel::BoundaryPolicy;
use crate::render::frame_layout_entry;

const KERNEL_TEMPLATE: &str = include_str!("kernel.wgsl");
pub const KERNEL_ENTRY_POINT: &str = "main";

const CLAMPED_NEIGHBOR_STATE: &str = "\
// Off-grid neighbors count as dead.
fn neighbor_state(x: u32, y: u32, dx: i32, dy: i32) -> u32 {
    let nx = i32(x) + dx;
    let ny = i32(y) + dy;
    if (nx < 0 || ny < 0 || nx >= i32(dims.width) || ny >= i32(dims.height)) {
        return 0u;
    }
    return cells_in[to_index(u32(nx), u32(ny))];
}";

const TOROIDAL_NEIGHBOR_STATE: &str = "\
// Coordinates wrap on all four edges.
fn neighbor_state(x: u32, y: u32, dx: i32, dy: i32) -> u32 {
    let w = i32(dims.width);
    let h = i32(dims.height);
    let nx = ((i32(x) + dx) % w + w) % w;
    let ny = ((i32(y) + dy) % h + h) % h;
    return cells_in[to_index(u32(nx), u32(ny))];
}";

const FRAME_BINDING: &str =
    "@group(0) @binding(3) var frame: texture_storage_2d<rgba8unorm, write>;";

const FRAME_STORE: &str = "    let shade = f32(next);
    textureStore(frame, vec2<i32>(i32(id.x), i32(id.y)), vec4<f32>(shade, shade, shade, 1.0));";

fn wgsl_table(table: &[u32]) -> String {
    table
        .iter()
        .map(|v| format!("{v}u"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// WGSL source of the kernel for one configuration: rule tables, boundary
/// policy, tile size and visualization output are baked in.
pub fn compose_shader(config: &LifeConfig) -> String {
    let neighbor_state = match config.boundary {
        BoundaryPolicy::Clamped => CLAMPED_NEIGHBOR_STATE,
        BoundaryPolicy::Toroidal => TOROIDAL_NEIGHBOR_STATE,
    };
    let (frame_binding, frame_store) = if config.visualize {
        (FRAME_BINDING, FRAME_STORE)
    } else {
        ("", "")
    };
    KERNEL_TEMPLATE
        .replace("{{FRAME_BINDING}}", frame_binding)
        .replace("{{SURVIVE}}", &wgsl_table(&config.rules.survive))
        .replace("{{BIRTH}}", &wgsl_table(&config.rules.birth))
        .replace("{{NEIGHBOR_STATE}}", neighbor_state)
        .replace("{{TILE_X}}", &config.tile.x.to_string())
        .replace("{{TILE_Y}}", &config.tile.y.to_string())
        .replace("{{FRAME_STORE}}", frame_store)
}

pub fn create_compute_bind_group_layout(
    device: &wgpu::Device,
    visualize: bool,
) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        wgpu::BindGroupLayoutEntry { // Grid dimensions
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<GridDims>() as u64),
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry { // Input snapshot
            binding: 1,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry { // Output snapshot
            binding: 2,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
    ];
    if visualize {
        entries.push(frame_layout_entry(3));
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Compute Bind Group Layout"),
        entries: &entries,
    })
}

/// Bind group `i` reads `grid_buffers[i]` and writes the other buffer, so
/// alternating between them swaps the snapshot roles without copying.
pub fn create_compute_bind_groups(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    grid_buffers: &[wgpu::Buffer; 2],
    dims_buffer: &wgpu::Buffer,
    frame_view: Option<&wgpu::TextureView>,
) -> [wgpu::BindGroup; 2] {
    let create = |label, input: &wgpu::Buffer, output: &wgpu::Buffer| {
        let mut entries = vec![
            wgpu::BindGroupEntry { binding: 0, resource: dims_buffer.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: input.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 2, resource: output.as_entire_binding() },
        ];
        if let Some(view) = frame_view {
            entries.push(wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &entries,
        })
    };
    [
        create("Compute Bind Group 0", &grid_buffers[0], &grid_buffers[1]),
        create("Compute Bind Group 1", &grid_buffers[1], &grid_buffers[0]),
    ]
}
