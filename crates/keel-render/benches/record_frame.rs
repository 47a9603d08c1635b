#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
#[cfg(not(target_arch = "wasm32"))]
use keel_render::state::State;
#[cfg(not(target_arch = "wasm32"))]
use keel_render::{
    render_tag, AllocationInfo, Attribute, AttributeKind, BufferKind, ClearCmd, Color,
    DrawBuffers, DrawCmd, ElementKind, Extent2D, Frontend, FrontendOptions, NullBackend,
    PayloadSlice, PrimitiveKind, Shader, ShaderKind, TextureBindings, UniformKind,
};

/// A frontend with a swapchain target, a mesh buffer and a program already
/// initialized, plus a draw template against them.
#[cfg(not(target_arch = "wasm32"))]
fn recording_fixture() -> (Frontend, DrawCmd, ClearCmd, usize) {
    let frontend = Frontend::new(AllocationInfo::default(), FrontendOptions::default());

    let target = frontend.create_target(render_tag!("bench swapchain")).unwrap();
    frontend
        .target_mut(target)
        .unwrap()
        .record_swapchain(Extent2D {
            width: 1920,
            height: 1080,
        })
        .unwrap();
    frontend
        .initialize_target(render_tag!("bench swapchain"), target)
        .unwrap();

    let buffer = frontend.create_buffer(render_tag!("bench mesh")).unwrap();
    {
        let mut record = frontend.buffer_mut(buffer).unwrap();
        record.record_kind(BufferKind::Static).unwrap();
        record.record_stride(12).unwrap();
        record.record_element_kind(ElementKind::None).unwrap();
        record.record_attribute(Attribute {
            kind: AttributeKind::F32,
            count: 3,
            offset: 0,
        });
        record.write_vertices(&vec![0_u8; 36 * 1024]).unwrap();
    }
    frontend
        .initialize_buffer(render_tag!("bench mesh"), buffer)
        .unwrap();

    let program = frontend.create_program(render_tag!("bench program")).unwrap();
    let mvp = {
        let mut record = frontend.program_mut(program).unwrap();
        record
            .add_shader(Shader {
                kind: ShaderKind::Vertex,
                source: "void main() {}".into(),
            })
            .unwrap();
        record.add_uniform("u_mvp", UniformKind::Mat4x4F)
    };
    frontend
        .initialize_program(render_tag!("bench program"), program)
        .unwrap();

    let draw = DrawCmd {
        state: State::default(),
        target,
        buffer,
        program,
        draw_buffers: DrawBuffers::first(),
        textures: TextureBindings::new(),
        primitive: PrimitiveKind::Triangles,
        count: 3 * 1024,
        offset: 0,
        uniforms: PayloadSlice::EMPTY,
    };
    let clear = ClearCmd {
        target,
        draw_buffers: DrawBuffers::first(),
        depth: Some(1.0),
        stencil: None,
        colors: [Some(Color::TRANSPARENT_BLACK), None, None, None, None, None, None, None],
    };
    (frontend, draw, clear, mvp)
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_record_frame(c: &mut Criterion) {
    let (frontend, draw, clear, mvp) = recording_fixture();
    let mut backend = NullBackend;

    let mut group = c.benchmark_group("record_frame");
    for draws in [16_usize, 64, 256] {
        group.throughput(Throughput::Elements(draws as u64));
        group.bench_with_input(BenchmarkId::from_parameter(draws), &draws, |b, &draws| {
            let program = draw.program;
            b.iter(|| {
                frontend.clear(render_tag!("bench clear"), clear).unwrap();
                for i in 0..draws {
                    // Dirty one uniform so every draw flushes a payload.
                    frontend
                        .program_mut(program)
                        .unwrap()
                        .record_mat4x4f(mvp, [[i as f32; 4]; 4])
                        .unwrap();
                    frontend
                        .draw(render_tag!("bench draw"), draw.clone())
                        .unwrap();
                }
                black_box(frontend.process(&mut backend).unwrap())
            })
        });
    }
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_state_flush(c: &mut Criterion) {
    c.bench_function("state_flush_after_single_write", |b| {
        let mut state = State::default();
        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            state.depth.record_test(black_box(toggle));
            state.flush();
            black_box(state.hash())
        })
    });

    c.bench_function("state_compare_equal", |b| {
        let a = State::default();
        let other = State::default();
        b.iter(|| black_box(a == other))
    });
}

#[cfg(not(target_arch = "wasm32"))]
criterion_group!(benches, bench_record_frame, bench_state_flush);
#[cfg(not(target_arch = "wasm32"))]
criterion_main!(benches);
