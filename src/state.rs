use crate::compute::{
    compose_shader, create_compute_bind_group_layout, create_compute_bind_groups,
    KERNEL_ENTRY_POINT,
};
use crate::config::LifeConfig;
use crate::error::LifeError;
use crate::grid::{Grid, GridDims};
use crate::render::{create_frame_texture, padded_bytes_per_row, unpad_frame};
use std::borrow::Cow;
use wgpu::util::DeviceExt;

/// Device-side run of one grid: the two snapshot buffers, the pipeline built
/// for this configuration and the optional visualization texture.
///
/// Buffer roles alternate with the generation: `grid_buffers[generation % 2]`
/// holds the current snapshot and is the input of the next step.
pub struct LifeState {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    config: LifeConfig,

    grid_buffers: [wgpu::Buffer; 2],
    dims_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,

    compute_pipeline: wgpu::ComputePipeline,
    compute_bind_groups: [wgpu::BindGroup; 2],

    frame_texture: Option<wgpu::Texture>,
    frame_staging_buffer: Option<wgpu::Buffer>,

    generation: u64,
}

impl LifeState {
    /// Acquires a device of its own and uploads `initial` as generation 0.
    pub async fn new(config: LifeConfig, initial: &Grid) -> Result<Self, LifeError> {
        config.validate()?;
        config.check_dims(initial.dims())?;

        log::info!("Initializing wgpu...");
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or(LifeError::NoAdapter)?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        if !adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            log::warn!("Adapter does not support compute shaders");
            return Err(LifeError::NoAdapter);
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Life Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await?;

        Self::from_device(device, queue, config, initial).await
    }

    /// Builds the run on a device owned by the caller, e.g. one shared with a
    /// presenter.
    pub async fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: LifeConfig,
        initial: &Grid,
    ) -> Result<Self, LifeError> {
        config.validate()?;
        config.check_dims(initial.dims())?;
        check_device_limits(&device.limits(), &config)?;

        let dims = config.dims();
        let buffer_size = (dims.cell_count() * std::mem::size_of::<u32>()) as u64;

        let dims_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Dimensions"),
            contents: bytemuck::bytes_of(&dims),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let grid_buffers = [
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Grid Buffer 0"),
                contents: bytemuck::cast_slice(initial.cells()),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
            }),
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Grid Buffer 1"),
                size: buffer_size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            }),
        ];
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Grid Readback Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_texture = config
            .visualize
            .then(|| create_frame_texture(&device, dims.width, dims.height));
        let frame_view = frame_texture
            .as_ref()
            .map(|texture| texture.create_view(&wgpu::TextureViewDescriptor::default()));
        let frame_staging_buffer = config.visualize.then(|| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Visualization Readback Buffer"),
                size: padded_bytes_per_row(dims.width) as u64 * dims.height as u64,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let compute_bind_group_layout = create_compute_bind_group_layout(&device, config.visualize);
        let compute_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Compute Pipeline Layout"),
                bind_group_layouts: &[&compute_bind_group_layout],
                push_constant_ranges: &[],
            });
        let compute_bind_groups = create_compute_bind_groups(
            &device,
            &compute_bind_group_layout,
            &grid_buffers,
            &dims_buffer,
            frame_view.as_ref(),
        );

        log::info!(
            "Compiling compute shader ({:?}, {}, tile {}x{})...",
            config.boundary,
            config.rules,
            config.tile.x,
            config.tile.y
        );
        let source = compose_shader(&config);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Life Kernel"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
        });
        let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Life Compute Pipeline"),
            layout: Some(&compute_pipeline_layout),
            module: &shader_module,
            entry_point: KERNEL_ENTRY_POINT,
        });
        if let Some(error) = device.pop_error_scope().await {
            return Err(LifeError::Shader(error.to_string()));
        }
        log::info!("Compute shader compiled successfully.");

        Ok(Self {
            device,
            queue,
            config,
            grid_buffers,
            dims_buffer,
            staging_buffer,
            compute_pipeline,
            compute_bind_groups,
            frame_texture,
            frame_staging_buffer,
            generation: 0,
        })
    }

    pub fn config(&self) -> &LifeConfig {
        &self.config
    }

    pub fn dims(&self) -> GridDims {
        self.config.dims()
    }

    /// Number of steps taken since the last upload.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Buffer holding the current generation.
    pub fn current_buffer(&self) -> &wgpu::Buffer {
        &self.grid_buffers[self.current()]
    }

    /// Uniform holding the grid dimensions, for presenters that bind it.
    pub fn dims_buffer(&self) -> &wgpu::Buffer {
        &self.dims_buffer
    }

    /// Visualization of the latest generation, if enabled. Before the first
    /// step its contents are undefined.
    pub fn frame_texture(&self) -> Option<&wgpu::Texture> {
        self.frame_texture.as_ref()
    }

    fn current(&self) -> usize {
        (self.generation % 2) as usize
    }

    /// Replaces the current snapshot. The generation counter restarts.
    pub fn upload(&mut self, grid: &Grid) -> Result<(), LifeError> {
        self.config.check_dims(grid.dims())?;
        self.generation = 0;
        self.queue.write_buffer(&self.grid_buffers[0], 0, bytemuck::cast_slice(grid.cells()));
        log::debug!("Uploaded {} live cells", grid.live_count());
        Ok(())
    }

    fn encode_generation(&self, encoder: &mut wgpu::CommandEncoder, generation: u64) {
        let (dispatch_x, dispatch_y) = self.config.tile.workgroups(self.dims());
        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Life Compute Pass"),
            timestamp_writes: None,
        });
        compute_pass.set_pipeline(&self.compute_pipeline);
        compute_pass.set_bind_group(0, &self.compute_bind_groups[(generation % 2) as usize], &[]);
        compute_pass.dispatch_workgroups(dispatch_x, dispatch_y, 1);
    }

    /// Advances one generation.
    pub fn step(&mut self) {
        self.run(1);
    }

    /// Advances `generations` generations in a single submission. Each
    /// generation is its own compute pass, so every write of one generation
    /// completes before the next one reads it.
    pub fn run(&mut self, generations: u64) {
        if generations == 0 {
            return;
        }
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Compute Encoder"),
        });
        for offset in 0..generations {
            self.encode_generation(&mut encoder, self.generation + offset);
        }
        self.queue.submit(Some(encoder.finish()));
        self.generation += generations;
        log::debug!(
            "Dispatched {} generation(s), now at generation {}",
            generations,
            self.generation
        );
    }

    /// Copies the current snapshot back to the host.
    pub fn read_grid(&self) -> Result<Grid, LifeError> {
        let size = self.staging_buffer.size();
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Grid Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(self.current_buffer(), 0, &self.staging_buffer, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let cells: Vec<u32> = self.map_read(&self.staging_buffer, |data| {
            bytemuck::cast_slice(data).to_vec()
        })?;
        Grid::from_cells(self.dims(), cells)
    }

    /// Live cells in the current generation. Blocks on a readback.
    pub fn live_cell_count(&self) -> Result<usize, LifeError> {
        Ok(self.read_grid()?.live_count())
    }

    /// Copies the visualization image back to the host as tightly packed
    /// RGBA8 pixels in row-major order.
    pub fn read_frame(&self) -> Result<Vec<[u8; 4]>, LifeError> {
        let (Some(texture), Some(staging)) = (&self.frame_texture, &self.frame_staging_buffer)
        else {
            return Err(LifeError::VisualizationDisabled);
        };
        let dims = self.dims();
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Visualization Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row(dims.width)),
                    rows_per_image: Some(dims.height),
                },
            },
            texture.size(),
        );
        self.queue.submit(Some(encoder.finish()));

        self.map_read(staging, |data| unpad_frame(data, dims.width, dims.height))
    }

    fn map_read<T>(
        &self,
        buffer: &wgpu::Buffer,
        decode: impl FnOnce(&[u8]) -> T,
    ) -> Result<T, LifeError> {
        let buffer_slice = buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        match receiver.recv() {
            Ok(result) => result?,
            Err(_) => {
                log::warn!("Buffer map callback dropped without a result");
                return Err(LifeError::BufferMap(wgpu::BufferAsyncError));
            }
        }

        let decoded = {
            let data = buffer_slice.get_mapped_range();
            decode(&data[..])
        };
        buffer.unmap();
        Ok(decoded)
    }
}

/// Rejects configurations the device could not dispatch.
fn check_device_limits(limits: &wgpu::Limits, config: &LifeConfig) -> Result<(), LifeError> {
    let buffer_size = (config.dims().cell_count() * std::mem::size_of::<u32>()) as u64;
    let tile = config.tile;
    let (groups_x, groups_y) = tile.workgroups(config.dims());
    let checks = [
        (
            "Snapshot buffer size",
            buffer_size,
            limits.max_storage_buffer_binding_size as u64,
        ),
        ("Snapshot buffer size", buffer_size, limits.max_buffer_size),
        (
            "Workgroup invocations",
            tile.invocations(),
            limits.max_compute_invocations_per_workgroup as u64,
        ),
        (
            "Workgroup width",
            tile.x as u64,
            limits.max_compute_workgroup_size_x as u64,
        ),
        (
            "Workgroup height",
            tile.y as u64,
            limits.max_compute_workgroup_size_y as u64,
        ),
        (
            "Workgroup count",
            groups_x.max(groups_y) as u64,
            limits.max_compute_workgroups_per_dimension as u64,
        ),
    ];
    let exceeded = checks
        .iter()
        .find(|(_, requested, limit)| requested > limit);
    if let Some(&(what, requested, limit)) = exceeded {
        return Err(LifeError::ExceedsDeviceLimit {
            what,
            requested,
            limit,
        });
    }
    if config.visualize {
        let side = config.width.max(config.height) as u64;
        let limit = limits.max_texture_dimension_2d as u64;
        if side > limit {
            return Err(LifeError::ExceedsDeviceLimit {
                what: "Visualization texture side",
                requested: side,
                limit,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fits_downlevel_limits() {
        let limits = wgpu::Limits::downlevel_defaults();
        assert!(check_device_limits(&limits, &LifeConfig::default()).is_ok());
        assert!(check_device_limits(&limits, &LifeConfig::default().with_tile(5, 5)).is_ok());
    }

    #[test]
    fn oversized_tile_is_rejected() {
        let limits = wgpu::Limits::downlevel_defaults();
        let config = LifeConfig::default().with_tile(32, 32);
        let err = check_device_limits(&limits, &config).unwrap_err();
        assert!(matches!(
            err,
            LifeError::ExceedsDeviceLimit { what: "Workgroup invocations", requested: 1024, .. }
        ));
    }

    #[test]
    fn huge_tile_invocation_count_does_not_wrap() {
        // 65536 * 65536 is 2^32, which is zero in u32 arithmetic.
        let limits = wgpu::Limits::downlevel_defaults();
        let config = LifeConfig::new(16, 16).with_tile(65536, 65536);
        assert!(matches!(
            check_device_limits(&limits, &config),
            Err(LifeError::ExceedsDeviceLimit {
                what: "Workgroup invocations",
                requested: 4_294_967_296,
                ..
            })
        ));
    }

    #[test]
    fn oversized_texture_is_rejected_only_when_visualizing() {
        let limits = wgpu::Limits::downlevel_defaults();
        let side = limits.max_texture_dimension_2d + 1;
        let config = LifeConfig::new(side, 1);
        assert!(matches!(
            check_device_limits(&limits, &config),
            Err(LifeError::ExceedsDeviceLimit { what: "Visualization texture side", .. })
        ));
        assert!(check_device_limits(&limits, &config.with_visualization(false)).is_ok());
    }
}
