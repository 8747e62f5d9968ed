#![no_main]

use libfuzzer_sys::fuzz_target;
use ply_mesh::{
    io::ply::{NonTrianglePolicy, ReadOptions, Reader},
    mesh::{Material, MeshKernel},
};

fuzz_target!(|data: &[u8]| {
    // We are only interested in panics or other even worse crashes, so the
    // returned `Result` is ignored. It's fine if the reader says "this is not
    // a valid PLY file".
    let strict = data.len() % 2 == 0;
    let options = ReadOptions {
        non_triangle_faces: if strict { NonTrianglePolicy::Reject } else { NonTrianglePolicy::Skip },
        strict_ascii_faces: strict,
    };

    let mut mesh = MeshKernel::new();
    let mut material = Material::new();
    let _ = Reader::new(data).map(|r| r.with_options(options).read_into(&mut mesh, Some(&mut material)));
});
