//! Request routing: token gate, exhaustive method match, error wrapping.

use serde_json::Value;
use tracing::debug;

use core_rpc::{ErrorKind, Request, Response, RpcError};

use crate::handlers::{buffer, debug as debug_handlers, edit, pipe, query, shader, texture, vfs};
use crate::method::Method;
use crate::params::Params;
use crate::state::DaemonState;

/// Process one request. The bool is false when the daemon should stop (a
/// `shutdown` was served).
pub fn handle_request(request: &Request, state: &mut DaemonState) -> (Response, bool) {
    let id = request.id.clone();

    let Some(method) = Method::parse(&request.method) else {
        let err = RpcError::new(
            ErrorKind::MethodNotFound,
            format!("method not found: {}", request.method),
        );
        return (Response::error(id, &err), true);
    };

    if !method.is_open() && request.token() != Some(state.token.as_str()) {
        return (Response::error(id, &RpcError::unauthorized()), true);
    }

    debug!(target: "daemon.dispatch", method = %request.method, "request");
    let p = Params(&request.params);
    let mut running = true;

    let result: Result<Value, RpcError> = match method {
        Method::Ping => query::ping(&p, state),
        Method::OpenCapture => query::open_capture(&p, state),
        Method::Shutdown => {
            running = false;
            state.shutdown();
            Ok(serde_json::json!({"ok": true}))
        }

        Method::Info => query::info(&p, state),
        Method::Stats => query::stats(&p, state),
        Method::Log => query::log(&p, state),
        Method::Events => query::events(&p, state),
        Method::Draws => query::draws(&p, state),
        Method::Event => query::event(&p, state),
        Method::Draw => query::draw(&p, state),
        Method::Passes => query::passes(&p, state),
        Method::Pass => query::pass(&p, state),
        Method::PassDeps => query::pass_deps(&p, state),
        Method::Resources => query::resources(&p, state),
        Method::Resource => query::resource(&p, state),
        Method::Usage => query::usage(&p, state),
        Method::Count => query::count(&p, state),
        Method::Search => query::search(&p, state),
        Method::ShaderMap => query::shader_map(&p, state),

        Method::Pipeline => pipe::pipeline(&p, state),
        Method::Pipe(section) => pipe::pipe_section(section, &p, state),
        Method::Bindings => pipe::bindings(&p, state),
        Method::Descriptors => pipe::descriptors(&p, state),

        Method::Shader => shader::shader(&p, state),
        Method::Shaders => shader::shaders(&p, state),
        Method::ShadersPreload => query::shaders_preload(&p, state),
        Method::ShaderTargets => shader::shader_targets(&p, state),
        Method::ShaderReflect => shader::shader_reflect(&p, state),
        Method::ShaderConstants => shader::shader_constants(&p, state),
        Method::ShaderSource => shader::shader_source(&p, state),
        Method::ShaderDisasm => shader::shader_disasm(&p, state),
        Method::ShaderAll => shader::shader_all(&p, state),
        Method::ShaderListInfo => shader::shader_list_info(&p, state),
        Method::ShaderListDisasm => shader::shader_list_disasm(&p, state),

        Method::TexInfo => texture::tex_info(&p, state),
        Method::TexExport => texture::tex_export(&p, state),
        Method::TexRaw => texture::tex_raw(&p, state),
        Method::RtExport => texture::rt_export(&p, state),
        Method::RtDepth => texture::rt_depth(&p, state),
        Method::RtOverlay => texture::rt_overlay(&p, state),
        Method::TexStats => texture::tex_stats(&p, state),

        Method::BufInfo => buffer::buf_info(&p, state),
        Method::BufRaw => buffer::buf_raw(&p, state),
        Method::Postvs => buffer::postvs(&p, state),
        Method::MeshData => buffer::mesh_data(&p, state),
        Method::CbufferDecode => buffer::cbuffer_decode(&p, state),
        Method::VbufferDecode => buffer::vbuffer_decode(&p, state),
        Method::IbufferDecode => buffer::ibuffer_decode(&p, state),

        Method::CounterList => query::counter_list(&p, state),
        Method::PixelHistory => query::pixel_history(&p, state),

        Method::VfsLs => vfs::vfs_ls(&p, state),
        Method::VfsTree => vfs::vfs_tree(&p, state),

        Method::DebugPixel => debug_handlers::debug_pixel(&p, state),
        Method::DebugVertex => debug_handlers::debug_vertex(&p, state),
        Method::DebugThread => debug_handlers::debug_thread(&p, state),

        Method::ShaderEncodings => edit::shader_encodings(&p, state),
        Method::ShaderBuild => edit::shader_build(&p, state),
        Method::ShaderReplace => edit::shader_replace(&p, state),
        Method::ShaderRestore => edit::shader_restore(&p, state),
        Method::ShaderRestoreAll => edit::shader_restore_all(&p, state),
    };

    let response = match result {
        Ok(value) => Response::result(id, value),
        Err(err) => Response::error(id, &err),
    };
    (response, running)
}
