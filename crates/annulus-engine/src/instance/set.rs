use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::device::{
    BindGroupEntry, BindGroupHandle, BufferHandle, BufferUsage, CommandRecorder, GraphicsDevice,
    PipelineHandle,
};
use crate::error::{EngineError, EngineResult};
use crate::geometry::MeshData;
use crate::layout::plan;
use crate::packer::{PackedBuffer, PackedBuffers};

use super::{InstanceRecord, InstanceStrategy};

/// Byte images of the instance data, one variant per strategy.
#[derive(Debug, Clone, PartialEq)]
enum Packed {
    /// One single-element buffer per instance.
    PerObject(Vec<PackedBuffer>),
    /// Scale, offset, color sections plus optional vertex positions.
    Storage(PackedBuffers),
    /// Color+offset buffer and scale buffer.
    Vertex(PackedBuffers),
}

/// Mesh buffers an instance draw reuses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MeshDraw {
    pub vertex_buffer: Option<BufferHandle>,
    /// Drawn indexed when present.
    pub index_buffer: Option<BufferHandle>,
    /// Vertices (or indices) per instance.
    pub elements: u32,
}

impl MeshDraw {
    pub fn for_mesh(
        mesh: &MeshData,
        vertex_buffer: Option<BufferHandle>,
        index_buffer: Option<BufferHandle>,
    ) -> Self {
        Self { vertex_buffer, index_buffer, elements: mesh.draw_count() }
    }
}

/// Device resources created for an [`InstanceSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceGpu {
    strategy: InstanceStrategy,
    /// Instance count of the set that created these resources.
    instances: usize,
    group: u32,
    buffers: Vec<BufferHandle>,
    bind_groups: Vec<BindGroupHandle>,
}

impl InstanceGpu {
    #[inline]
    pub fn buffers(&self) -> &[BufferHandle] {
        &self.buffers
    }

    #[inline]
    pub fn bind_groups(&self) -> &[BindGroupHandle] {
        &self.bind_groups
    }
}

/// `count` random instances laid out for `strategy`.
///
/// Records are drawn once from a [`StdRng`]: seeded when `seed` is given,
/// from OS entropy otherwise. The set keeps them, so every query of one set
/// sees the same values.
pub fn allocate(strategy: InstanceStrategy, count: usize, seed: Option<u64>) -> EngineResult<InstanceSet> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let records = (0..count).map(|_| InstanceRecord::random(&mut rng)).collect();
    InstanceSet::from_records(strategy, records)
}

/// Instance records plus their packed byte images.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSet {
    strategy: InstanceStrategy,
    records: Vec<InstanceRecord>,
    /// 2D positions for the storage strategy's vertex section.
    vertices: Option<Vec<f32>>,
    packed: Packed,
    /// One flag per device buffer.
    dirty: Vec<bool>,
}

impl InstanceSet {
    pub fn from_records(strategy: InstanceStrategy, records: Vec<InstanceRecord>) -> EngineResult<Self> {
        let packed = pack(strategy, &records, None)?;
        let buffers = buffer_count(strategy, records.len());
        log::debug!("allocated {} instances ({strategy})", records.len());
        Ok(Self { strategy, records, vertices: None, packed, dirty: vec![true; buffers] })
    }

    #[inline]
    pub fn strategy(&self) -> InstanceStrategy {
        self.strategy
    }

    #[inline]
    pub fn records(&self) -> &[InstanceRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.iter().any(|&d| d)
    }

    /// Vertices each instance draws when positions come from the storage buffer.
    pub fn vertices_per_instance(&self) -> Option<u32> {
        self.vertices.as_ref().map(|v| (v.len() / 2) as u32)
    }

    /// Appends `mesh`'s positions (expanded to draw order) to the shared
    /// storage buffer so the shader reads `vertices[vertex_index % V]`.
    ///
    /// Call before [`InstanceSet::create_gpu_resources`]; the buffer size is
    /// fixed once created.
    pub fn attach_vertices(&mut self, mesh: &MeshData) -> EngineResult<()> {
        if self.strategy != InstanceStrategy::SharedStorage {
            return Err(EngineError::StrategyMismatch {
                operation: "attach_vertices",
                strategy: self.strategy.name(),
            });
        }
        mesh.validate()?;

        let positions = mesh.expanded_positions_2d();
        self.packed = pack(self.strategy, &self.records, Some(&positions))?;
        self.vertices = Some(positions);
        self.dirty.iter_mut().for_each(|d| *d = true);
        Ok(())
    }

    /// Recolors instance `index`, updating its packed bytes.
    pub fn set_color(&mut self, index: usize, rgba: [f32; 4]) -> EngineResult<()> {
        let len = self.records.len();
        let record = self.records.get_mut(index).ok_or(EngineError::WriteOutOfBounds {
            buffer: 0,
            start: index,
            end: index + 1,
            len,
        })?;
        record.color = rgba;

        match &mut self.packed {
            Packed::PerObject(buffers) => {
                buffers[index].write_field_f32(0, "color", &rgba)?;
                self.dirty[index] = true;
            }
            Packed::Storage(sections) => {
                sections.write_f32(2, index, 0, &rgba)?;
                self.dirty[0] = true;
            }
            Packed::Vertex(buffers) => {
                buffers.write_unorm8x4(0, index, 0, rgba)?;
                self.dirty[0] = true;
            }
        }
        Ok(())
    }

    /// Upload bytes of device buffer `buffer`.
    pub fn buffer_image(&self, buffer: usize) -> Option<Vec<u8>> {
        match &self.packed {
            Packed::PerObject(buffers) => buffers.get(buffer).map(|b| b.materialize().to_vec()),
            Packed::Storage(sections) if buffer == 0 && !self.records.is_empty() => {
                Some(sections.materialize_soa().bytes)
            }
            Packed::Storage(_) => None,
            Packed::Vertex(buffers) => buffers.materialize(buffer).map(<[u8]>::to_vec),
        }
    }

    fn buffer_usage(&self) -> BufferUsage {
        match self.strategy {
            InstanceStrategy::PerObjectUniform => BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            InstanceStrategy::SharedStorage => BufferUsage::STORAGE | BufferUsage::COPY_DST,
            InstanceStrategy::VertexAttributes => BufferUsage::VERTEX | BufferUsage::COPY_DST,
        }
    }

    /// Creates and fills the device buffers, plus bind groups for layout
    /// `group` of `pipeline` where the strategy binds its data.
    ///
    /// An empty set creates nothing.
    pub fn create_gpu_resources(
        &mut self,
        device: &mut dyn GraphicsDevice,
        pipeline: PipelineHandle,
        group: u32,
    ) -> EngineResult<InstanceGpu> {
        let mut gpu = InstanceGpu {
            strategy: self.strategy,
            instances: self.records.len(),
            group,
            buffers: Vec::with_capacity(self.dirty.len()),
            bind_groups: Vec::new(),
        };
        let usage = self.buffer_usage();

        for i in 0..self.dirty.len() {
            let Some(image) = self.buffer_image(i).filter(|b| !b.is_empty()) else { continue };
            let label = format!("{} instances #{i}", self.strategy);
            let buffer = device.create_buffer(image.len() as u64, usage, &label)?;
            device.write_buffer(buffer, 0, &image)?;
            gpu.buffers.push(buffer);
        }
        self.dirty.iter_mut().for_each(|d| *d = false);

        if self.strategy != InstanceStrategy::VertexAttributes {
            for &buffer in &gpu.buffers {
                let bind_group =
                    device.create_bind_group(pipeline, group, &[BindGroupEntry { binding: 0, buffer }])?;
                gpu.bind_groups.push(bind_group);
            }
        }

        Ok(gpu)
    }

    /// Re-uploads every dirty buffer wholesale. Returns how many were written.
    pub fn upload(&mut self, device: &mut dyn GraphicsDevice, gpu: &InstanceGpu) -> EngineResult<usize> {
        self.check_gpu("upload", gpu)?;

        let mut written = 0;
        for (i, &buffer) in gpu.buffers.iter().enumerate() {
            if !self.dirty[i] {
                continue;
            }
            if let Some(image) = self.buffer_image(i) {
                device.write_buffer(buffer, 0, &image)?;
                written += 1;
            }
            self.dirty[i] = false;
        }
        Ok(written)
    }

    /// Records this strategy's draw calls. The pipeline must already be set.
    ///
    /// - per-object: N × (bind group + draw)
    /// - shared storage: one bind group, one draw of `V × N` vertices
    /// - vertex attributes: mesh and instance buffers, one instanced draw
    pub fn record_draws(
        &self,
        gpu: &InstanceGpu,
        recorder: &mut CommandRecorder,
        mesh: &MeshDraw,
    ) -> EngineResult<()> {
        self.check_gpu("record_draws", gpu)?;
        if self.records.is_empty() {
            return Ok(());
        }

        let n = self.records.len() as u32;
        match self.strategy {
            InstanceStrategy::PerObjectUniform => {
                bind_mesh(recorder, mesh);
                for &bind_group in &gpu.bind_groups {
                    recorder.set_bind_group(gpu.group, bind_group);
                    draw_mesh(recorder, mesh, 1);
                }
            }
            InstanceStrategy::SharedStorage => {
                let per_instance = self.vertices_per_instance().unwrap_or(mesh.elements);
                if let Some(&bind_group) = gpu.bind_groups.first() {
                    recorder.set_bind_group(gpu.group, bind_group);
                }
                recorder.draw(per_instance * n, 1);
            }
            InstanceStrategy::VertexAttributes => {
                bind_mesh(recorder, mesh);
                for (slot, &buffer) in gpu.buffers.iter().enumerate() {
                    recorder.set_vertex_buffer(slot as u32 + 1, buffer);
                }
                draw_mesh(recorder, mesh, n);
            }
        }
        Ok(())
    }

    /// Resources must come from a set of the same strategy and size.
    fn check_gpu(&self, operation: &'static str, gpu: &InstanceGpu) -> EngineResult<()> {
        let same_shape =
            gpu.instances == self.records.len() && gpu.buffers.len() <= self.dirty.len();
        if gpu.strategy != self.strategy || !same_shape {
            return Err(EngineError::StrategyMismatch { operation, strategy: gpu.strategy.name() });
        }
        Ok(())
    }
}

fn bind_mesh(recorder: &mut CommandRecorder, mesh: &MeshDraw) {
    if let Some(vb) = mesh.vertex_buffer {
        recorder.set_vertex_buffer(0, vb);
    }
    if let Some(ib) = mesh.index_buffer {
        recorder.set_index_buffer(ib);
    }
}

fn draw_mesh(recorder: &mut CommandRecorder, mesh: &MeshDraw, instances: u32) {
    if mesh.index_buffer.is_some() {
        recorder.draw_indexed(mesh.elements, instances);
    } else {
        recorder.draw(mesh.elements, instances);
    }
}

fn buffer_count(strategy: InstanceStrategy, count: usize) -> usize {
    match strategy {
        InstanceStrategy::PerObjectUniform => count,
        InstanceStrategy::SharedStorage => 1,
        InstanceStrategy::VertexAttributes => 2,
    }
}

fn pack(
    strategy: InstanceStrategy,
    records: &[InstanceRecord],
    vertices: Option<&[f32]>,
) -> EngineResult<Packed> {
    let n = records.len();
    let mut specs = strategy.buffer_specs();

    match strategy {
        InstanceStrategy::PerObjectUniform => {
            let layout = plan(&specs)?.buffers.remove(0);
            let buffers = records
                .iter()
                .map(|r| {
                    let mut buf = PackedBuffer::new(layout.clone(), 1);
                    buf.write_field_f32(0, "scale", &r.scale)?;
                    buf.write_field_f32(0, "offset", &r.offset)?;
                    buf.write_field_f32(0, "color", &r.color)?;
                    Ok(buf)
                })
                .collect::<EngineResult<Vec<_>>>()?;
            Ok(Packed::PerObject(buffers))
        }
        InstanceStrategy::SharedStorage => {
            let mut counts = vec![n, n, n];
            if let Some(v) = vertices {
                specs.push(InstanceStrategy::storage_vertex_spec());
                counts.push(v.len() / 2);
            }
            let mut sections = PackedBuffers::allocate(&plan(&specs)?, &counts)?;
            for (i, r) in records.iter().enumerate() {
                sections.write_f32(0, i, 0, &r.scale)?;
                sections.write_f32(1, i, 0, &r.offset)?;
                sections.write_f32(2, i, 0, &r.color)?;
            }
            if let Some(v) = vertices {
                for (i, xy) in v.chunks_exact(2).enumerate() {
                    sections.write_f32(3, i, 0, xy)?;
                }
            }
            Ok(Packed::Storage(sections))
        }
        InstanceStrategy::VertexAttributes => {
            let mut buffers = PackedBuffers::allocate(&plan(&specs)?, &[n, n])?;
            for (i, r) in records.iter().enumerate() {
                buffers.write_unorm8x4(0, i, 0, r.color)?;
                buffers.write_f32(0, i, 4, &r.offset)?;
                buffers.write_f32(1, i, 0, &r.scale)?;
            }
            Ok(Packed::Vertex(buffers))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HeadlessDevice, PipelineDesc, Presentation, RenderCommand};
    use crate::geometry::{generate_ring, RingParams};

    fn f32_at(bytes: &[u8], at: usize) -> f32 {
        f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn device_and_pipeline() -> (HeadlessDevice, PipelineHandle) {
        let mut dev = HeadlessDevice::new();
        let shader = dev.create_shader("instances", "// test").unwrap();
        let pipeline = dev.create_render_pipeline(&PipelineDesc::new("instances", shader)).unwrap();
        (dev, pipeline)
    }

    fn recorder(dev: &mut HeadlessDevice) -> CommandRecorder {
        let target = dev.current_frame_target().unwrap();
        dev.begin_frame(target, [1.0; 4]).unwrap()
    }

    fn draws(rec: &CommandRecorder) -> Vec<RenderCommand> {
        rec.commands().iter().copied().filter(RenderCommand::is_draw).collect()
    }

    // ── allocation ────────────────────────────────────────────────────────

    #[test]
    fn seeded_storage_allocation_is_reproducible() {
        let a = allocate(InstanceStrategy::SharedStorage, 3, Some(42)).unwrap();
        let b = allocate(InstanceStrategy::SharedStorage, 3, Some(42)).unwrap();
        assert_eq!(a.len(), 3);
        assert!(a.records().iter().all(InstanceRecord::is_within_ranges));
        assert_eq!(a.records(), b.records());
        assert_eq!(a.buffer_image(0), b.buffer_image(0));
    }

    #[test]
    fn unseeded_set_is_stable_once_drawn() {
        let set = allocate(InstanceStrategy::PerObjectUniform, 4, None).unwrap();
        assert_eq!(set.records(), set.records());
        assert_eq!(set.buffer_image(3), set.buffer_image(3));
    }

    #[test]
    fn empty_sets_are_valid() {
        for strategy in InstanceStrategy::ALL {
            let mut set = allocate(strategy, 0, Some(1)).unwrap();
            let (mut dev, pipeline) = device_and_pipeline();
            let gpu = set.create_gpu_resources(&mut dev, pipeline, 0).unwrap();
            assert_eq!(dev.bind_group_count(), 0);

            let mut rec = recorder(&mut dev);
            set.record_draws(&gpu, &mut rec, &MeshDraw { vertex_buffer: None, index_buffer: None, elements: 6 })
                .unwrap();
            assert!(rec.commands().is_empty(), "{strategy}");
        }
    }

    // ── byte images ───────────────────────────────────────────────────────

    #[test]
    fn per_object_buffers_hold_one_record() {
        let set = allocate(InstanceStrategy::PerObjectUniform, 2, Some(3)).unwrap();
        let r = set.records()[1];
        let image = set.buffer_image(1).unwrap();
        assert_eq!(image.len(), 32);
        assert_eq!(f32_at(&image, 0), r.scale[0]);
        assert_eq!(f32_at(&image, 8), r.offset[0]);
        assert_eq!(f32_at(&image, 28), 1.0);
    }

    #[test]
    fn storage_image_is_structure_of_arrays() {
        let set = allocate(InstanceStrategy::SharedStorage, 3, Some(42)).unwrap();
        let image = set.buffer_image(0).unwrap();
        // scales 0..24, offsets 24..48, colors 48..96
        assert_eq!(image.len(), 96);
        let r = set.records()[2];
        assert_eq!(f32_at(&image, 16), r.scale[0]);
        assert_eq!(f32_at(&image, 24 + 16 + 4), r.offset[1]);
        assert_eq!(f32_at(&image, 48 + 32 + 8), r.color[2]);
    }

    #[test]
    fn storage_vertices_follow_colors() {
        let mesh = generate_ring(RingParams::disc(1.0, 24, [1.0; 4]), false).unwrap();
        let mut set = allocate(InstanceStrategy::SharedStorage, 100, Some(5)).unwrap();
        set.attach_vertices(&mesh).unwrap();
        assert_eq!(set.vertices_per_instance(), Some(144));

        let image = set.buffer_image(0).unwrap();
        // 100 × (8 + 8 + 16) + 144 × 8
        assert_eq!(image.len(), 3200 + 1152);
        assert_eq!(f32_at(&image, 3200), 1.0);
    }

    #[test]
    fn attach_vertices_requires_storage() {
        let mesh = generate_ring(RingParams::default(), false).unwrap();
        let mut set = allocate(InstanceStrategy::VertexAttributes, 2, Some(1)).unwrap();
        assert!(matches!(
            set.attach_vertices(&mesh),
            Err(EngineError::StrategyMismatch { .. })
        ));
    }

    #[test]
    fn vertex_image_packs_color_bytes() {
        let mut set = allocate(InstanceStrategy::VertexAttributes, 2, Some(9)).unwrap();
        set.set_color(1, [1.0, 0.0, 0.5, 1.0]).unwrap();
        let image = set.buffer_image(0).unwrap();
        assert_eq!(image.len(), 24);
        assert_eq!(&image[12..16], &[255, 0, 128, 255]);
        assert_eq!(f32_at(&image, 16), set.records()[1].offset[0]);
        assert_eq!(set.buffer_image(1).unwrap().len(), 16);
    }

    // ── device side ───────────────────────────────────────────────────────

    #[test]
    fn per_object_records_n_bind_draw_pairs() {
        let (mut dev, pipeline) = device_and_pipeline();
        let mut set = allocate(InstanceStrategy::PerObjectUniform, 5, Some(1)).unwrap();
        let gpu = set.create_gpu_resources(&mut dev, pipeline, 0).unwrap();
        assert_eq!(gpu.buffers().len(), 5);
        assert_eq!(gpu.bind_groups().len(), 5);

        let mut rec = recorder(&mut dev);
        rec.set_pipeline(pipeline);
        set.record_draws(&gpu, &mut rec, &MeshDraw { vertex_buffer: None, index_buffer: None, elements: 144 })
            .unwrap();
        let binds = rec
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::SetBindGroup { .. }))
            .count();
        assert_eq!(binds, 5);
        assert_eq!(draws(&rec), vec![RenderCommand::Draw { vertices: 144, instances: 1 }; 5]);
        dev.submit(rec).unwrap();
    }

    #[test]
    fn storage_records_one_multiplied_draw() {
        let mesh = generate_ring(RingParams::disc(1.0, 24, [1.0; 4]), false).unwrap();
        let (mut dev, pipeline) = device_and_pipeline();
        let mut set = allocate(InstanceStrategy::SharedStorage, 100, Some(1)).unwrap();
        set.attach_vertices(&mesh).unwrap();
        let gpu = set.create_gpu_resources(&mut dev, pipeline, 0).unwrap();

        let mut rec = recorder(&mut dev);
        rec.set_pipeline(pipeline);
        set.record_draws(&gpu, &mut rec, &MeshDraw { vertex_buffer: None, index_buffer: None, elements: 0 })
            .unwrap();
        assert_eq!(draws(&rec), vec![RenderCommand::Draw { vertices: 14_400, instances: 1 }]);
        dev.submit(rec).unwrap();
    }

    #[test]
    fn vertex_strategy_records_one_instanced_draw() {
        let (mut dev, pipeline) = device_and_pipeline();
        let vb = dev.create_buffer(12 * 50, BufferUsage::VERTEX, "mesh").unwrap();
        let ib = dev.create_buffer(4 * 144, BufferUsage::INDEX, "mesh indices").unwrap();
        let mut set = allocate(InstanceStrategy::VertexAttributes, 100, Some(1)).unwrap();
        let gpu = set.create_gpu_resources(&mut dev, pipeline, 0).unwrap();
        assert_eq!(gpu.buffers().len(), 2);
        assert!(gpu.bind_groups().is_empty());

        let mut rec = recorder(&mut dev);
        rec.set_pipeline(pipeline);
        let mesh = MeshDraw { vertex_buffer: Some(vb), index_buffer: Some(ib), elements: 144 };
        set.record_draws(&gpu, &mut rec, &mesh).unwrap();
        assert_eq!(draws(&rec), vec![RenderCommand::DrawIndexed { indices: 144, instances: 100 }]);
        assert!(rec
            .commands()
            .contains(&RenderCommand::SetVertexBuffer { slot: 2, buffer: gpu.buffers()[1] }));
        dev.submit(rec).unwrap();
    }

    #[test]
    fn dirty_buffers_reupload_wholesale() {
        let (mut dev, pipeline) = device_and_pipeline();
        let mut set = allocate(InstanceStrategy::SharedStorage, 3, Some(42)).unwrap();
        let gpu = set.create_gpu_resources(&mut dev, pipeline, 0).unwrap();
        assert!(!set.is_dirty());
        assert_eq!(set.upload(&mut dev, &gpu).unwrap(), 0);

        set.set_color(0, [0.0, 1.0, 0.0, 1.0]).unwrap();
        assert!(set.is_dirty());
        assert_eq!(set.upload(&mut dev, &gpu).unwrap(), 1);
        let stored = dev.buffer_contents(gpu.buffers()[0]).unwrap();
        assert_eq!(stored, set.buffer_image(0).unwrap().as_slice());
        assert_eq!(dev.buffer_write_count(gpu.buffers()[0]), 2);
    }

    #[test]
    fn per_object_uploads_only_touched_buffer() {
        let (mut dev, pipeline) = device_and_pipeline();
        let mut set = allocate(InstanceStrategy::PerObjectUniform, 4, Some(2)).unwrap();
        let gpu = set.create_gpu_resources(&mut dev, pipeline, 0).unwrap();
        set.set_color(2, [0.5; 4]).unwrap();
        assert_eq!(set.upload(&mut dev, &gpu).unwrap(), 1);
        assert_eq!(dev.buffer_write_count(gpu.buffers()[2]), 2);
        assert_eq!(dev.buffer_write_count(gpu.buffers()[1]), 1);
    }

    #[test]
    fn set_color_out_of_range_rejected() {
        let mut set = allocate(InstanceStrategy::SharedStorage, 2, Some(2)).unwrap();
        let before = set.clone();
        assert!(matches!(set.set_color(2, [1.0; 4]), Err(EngineError::WriteOutOfBounds { .. })));
        assert_eq!(set, before);
    }

    #[test]
    fn mismatched_resources_rejected() {
        let (mut dev, pipeline) = device_and_pipeline();
        let mut a = allocate(InstanceStrategy::SharedStorage, 1, Some(1)).unwrap();
        let mut b = allocate(InstanceStrategy::PerObjectUniform, 1, Some(1)).unwrap();
        let gpu_a = a.create_gpu_resources(&mut dev, pipeline, 0).unwrap();
        assert!(matches!(b.upload(&mut dev, &gpu_a), Err(EngineError::StrategyMismatch { .. })));
    }

    #[test]
    fn resources_of_a_larger_set_rejected() {
        let (mut dev, pipeline) = device_and_pipeline();
        let mut five = allocate(InstanceStrategy::PerObjectUniform, 5, Some(1)).unwrap();
        let mut two = allocate(InstanceStrategy::PerObjectUniform, 2, Some(1)).unwrap();
        let gpu_five = five.create_gpu_resources(&mut dev, pipeline, 0).unwrap();
        let writes = dev.buffer_write_count(gpu_five.buffers()[0]);

        assert!(matches!(two.upload(&mut dev, &gpu_five), Err(EngineError::StrategyMismatch { .. })));
        let mut rec = recorder(&mut dev);
        let mesh = MeshDraw { vertex_buffer: None, index_buffer: None, elements: 3 };
        assert!(two.record_draws(&gpu_five, &mut rec, &mesh).is_err());
        assert!(rec.commands().is_empty());
        assert_eq!(dev.buffer_write_count(gpu_five.buffers()[0]), writes);
    }
}
