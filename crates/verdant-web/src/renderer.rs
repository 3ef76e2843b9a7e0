//! WebGL2 renderer drawing the scene into the XR layer framebuffer

use std::collections::{HashMap, HashSet};

use js_sys::{Float32Array, Object, Reflect, Uint32Array};
use thiserror::Error;
use tracing::{debug, warn};
use verdant_core::glam::{Mat3, Mat4};
use verdant_scene::{MeshData, NodeId, Scene};
use wasm_bindgen::prelude::*;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebGlVertexArrayObject, XrView, XrViewerPose, XrWebGlLayer,
};

const VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;

uniform mat4 u_view_projection;
uniform mat4 u_model;
uniform mat3 u_normal_matrix;

out vec3 v_normal;

void main() {
    v_normal = u_normal_matrix * a_normal;
    gl_Position = u_view_projection * u_model * vec4(a_position, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

in vec3 v_normal;

uniform vec4 u_base_color;
uniform vec3 u_ambient;
uniform vec3 u_light_color;
uniform vec3 u_light_dir;

out vec4 frag_color;

void main() {
    float lambert = max(dot(normalize(v_normal), u_light_dir), 0.0);
    vec3 lit = u_base_color.rgb * (u_ambient + u_light_color * lambert);
    frag_color = vec4(min(lit, vec3(1.0)), u_base_color.a);
}
"#;

const POSITION_LOCATION: u32 = 0;
const NORMAL_LOCATION: u32 = 1;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("WebGL2 is not available: {0}")]
    Context(String),
    #[error("Shader compilation failed: {0}")]
    Shader(String),
    #[error("Program link failed: {0}")]
    Link(String),
    #[error("Failed to allocate {0}")]
    Resource(&'static str),
    #[error("WebGL call failed: {0}")]
    Js(String),
}

impl From<JsValue> for RenderError {
    fn from(value: JsValue) -> Self {
        RenderError::Js(format!("{:?}", value))
    }
}

/// Create a WebGL2 context on the canvas suitable for an XR layer
///
/// The context keeps an alpha channel so the camera feed shows through.
pub fn create_context(canvas: &HtmlCanvasElement) -> Result<Gl, RenderError> {
    let options = Object::new();
    Reflect::set(&options, &"alpha".into(), &JsValue::TRUE)?;
    Reflect::set(&options, &"xrCompatible".into(), &JsValue::TRUE)?;
    canvas
        .get_context_with_context_options("webgl2", &options)?
        .ok_or_else(|| RenderError::Context("canvas returned no webgl2 context".into()))?
        .dyn_into::<Gl>()
        .map_err(|_| RenderError::Context("context is not WebGL2".into()))
}

struct Uniforms {
    view_projection: Option<WebGlUniformLocation>,
    model: Option<WebGlUniformLocation>,
    normal_matrix: Option<WebGlUniformLocation>,
    base_color: Option<WebGlUniformLocation>,
    ambient: Option<WebGlUniformLocation>,
    light_color: Option<WebGlUniformLocation>,
    light_dir: Option<WebGlUniformLocation>,
}

impl Uniforms {
    fn locate(gl: &Gl, program: &WebGlProgram) -> Self {
        Self {
            view_projection: gl.get_uniform_location(program, "u_view_projection"),
            model: gl.get_uniform_location(program, "u_model"),
            normal_matrix: gl.get_uniform_location(program, "u_normal_matrix"),
            base_color: gl.get_uniform_location(program, "u_base_color"),
            ambient: gl.get_uniform_location(program, "u_ambient"),
            light_color: gl.get_uniform_location(program, "u_light_color"),
            light_dir: gl.get_uniform_location(program, "u_light_dir"),
        }
    }
}

/// GPU copy of one `MeshData`
struct GpuMesh {
    vao: WebGlVertexArrayObject,
    buffers: [WebGlBuffer; 3],
    index_count: i32,
    base_color: [f32; 4],
}

impl GpuMesh {
    fn upload(gl: &Gl, mesh: &MeshData) -> Result<Self, RenderError> {
        let vao = gl
            .create_vertex_array()
            .ok_or(RenderError::Resource("vertex array"))?;
        gl.bind_vertex_array(Some(&vao));

        let positions: Vec<f32> = mesh.positions.iter().flat_map(|p| p.to_array()).collect();
        let normals: Vec<f32> = mesh.normals.iter().flat_map(|n| n.to_array()).collect();

        let position_buffer = vertex_buffer(gl, POSITION_LOCATION, &positions)?;
        let normal_buffer = vertex_buffer(gl, NORMAL_LOCATION, &normals)?;

        let index_buffer = gl.create_buffer().ok_or(RenderError::Resource("index buffer"))?;
        gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
        gl.buffer_data_with_array_buffer_view(
            Gl::ELEMENT_ARRAY_BUFFER,
            &Uint32Array::from(mesh.indices.as_slice()),
            Gl::STATIC_DRAW,
        );

        gl.bind_vertex_array(None);

        Ok(Self {
            vao,
            buffers: [position_buffer, normal_buffer, index_buffer],
            index_count: mesh.indices.len() as i32,
            base_color: mesh.base_color,
        })
    }

    fn release(self, gl: &Gl) {
        for buffer in &self.buffers {
            gl.delete_buffer(Some(buffer));
        }
        gl.delete_vertex_array(Some(&self.vao));
    }
}

fn vertex_buffer(gl: &Gl, location: u32, data: &[f32]) -> Result<WebGlBuffer, RenderError> {
    let buffer = gl.create_buffer().ok_or(RenderError::Resource("vertex buffer"))?;
    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
    gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &Float32Array::from(data), Gl::STATIC_DRAW);
    gl.enable_vertex_attrib_array(location);
    gl.vertex_attrib_pointer_with_i32(location, 3, Gl::FLOAT, false, 0, 0);
    Ok(buffer)
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, RenderError> {
    let shader = gl.create_shader(kind).ok_or(RenderError::Resource("shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(RenderError::Shader(log))
    }
}

fn link_program(gl: &Gl) -> Result<WebGlProgram, RenderError> {
    let vertex = compile_shader(gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
    let fragment = compile_shader(gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

    let program = gl.create_program().ok_or(RenderError::Resource("program"))?;
    gl.attach_shader(&program, &vertex);
    gl.attach_shader(&program, &fragment);
    gl.link_program(&program);

    // Shaders are owned by the program once linked
    gl.delete_shader(Some(&vertex));
    gl.delete_shader(Some(&fragment));

    if gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        Err(RenderError::Link(gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

/// Column-major 4x4 from a JS matrix, `None` unless it has 16 entries
fn mat4(values: &[f32]) -> Option<Mat4> {
    (values.len() == 16).then(|| Mat4::from_cols_slice(values))
}

pub struct Renderer {
    gl: Gl,
    program: WebGlProgram,
    uniforms: Uniforms,
    meshes: HashMap<NodeId, Vec<GpuMesh>>,
}

impl Renderer {
    pub fn new(gl: Gl) -> Result<Self, RenderError> {
        let program = link_program(&gl)?;
        let uniforms = Uniforms::locate(&gl, &program);
        Ok(Self {
            gl,
            program,
            uniforms,
            meshes: HashMap::new(),
        })
    }

    pub fn gl(&self) -> &Gl {
        &self.gl
    }

    /// Upload newly attached nodes and free detached ones
    fn sync(&mut self, scene: &Scene) {
        let live: HashSet<NodeId> = scene.nodes().iter().map(|node| node.id).collect();
        let stale: Vec<NodeId> = self
            .meshes
            .keys()
            .filter(|id| !live.contains(id))
            .copied()
            .collect();
        for id in stale {
            if let Some(meshes) = self.meshes.remove(&id) {
                debug!(node = id.raw(), "Releasing GPU meshes");
                for mesh in meshes {
                    mesh.release(&self.gl);
                }
            }
        }

        for node in scene.nodes() {
            if self.meshes.contains_key(&node.id) {
                continue;
            }
            let uploaded: Result<Vec<GpuMesh>, RenderError> = node
                .model
                .meshes
                .iter()
                .map(|mesh| GpuMesh::upload(&self.gl, mesh))
                .collect();
            let meshes = uploaded.unwrap_or_else(|e| {
                // Cache the failure so the upload is not retried every frame
                warn!(node = node.id.raw(), error = %e, "Mesh upload failed");
                Vec::new()
            });
            debug!(node = node.id.raw(), meshes = meshes.len(), "Uploaded GPU meshes");
            self.meshes.insert(node.id, meshes);
        }
    }

    /// Render one XR frame: clear to transparent, then draw every view
    pub fn render_xr(&mut self, layer: &XrWebGlLayer, pose: &XrViewerPose, scene: &Scene) {
        self.sync(scene);

        let gl = &self.gl;
        gl.bind_framebuffer(Gl::FRAMEBUFFER, layer.framebuffer().as_ref());
        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
        if scene.is_empty() {
            return;
        }
        gl.enable(Gl::DEPTH_TEST);

        for view in pose.views().iter() {
            let view: XrView = view.unchecked_into();
            let Some(viewport) = layer.get_viewport(&view) else {
                continue;
            };
            gl.viewport(viewport.x(), viewport.y(), viewport.width(), viewport.height());

            let projection = mat4(&view.projection_matrix()).unwrap_or_else(|| {
                let aspect = viewport.width() as f32 / viewport.height().max(1) as f32;
                scene.camera.projection(aspect)
            });
            let Some(view_matrix) = mat4(&view.transform().inverse().matrix()) else {
                continue;
            };
            self.draw_scene(projection * view_matrix, scene);
        }
    }

    fn draw_scene(&self, view_projection: Mat4, scene: &Scene) {
        let gl = &self.gl;
        let u = &self.uniforms;
        gl.use_program(Some(&self.program));

        gl.uniform_matrix4fv_with_f32_array(
            u.view_projection.as_ref(),
            false,
            &view_projection.to_cols_array(),
        );
        gl.uniform3fv_with_f32_array(u.ambient.as_ref(), &scene.lighting.ambient_radiance().to_array());
        gl.uniform3fv_with_f32_array(
            u.light_color.as_ref(),
            &scene.lighting.directional_radiance().to_array(),
        );
        gl.uniform3fv_with_f32_array(
            u.light_dir.as_ref(),
            &scene.lighting.directional.to_light().to_array(),
        );

        for node in scene.nodes() {
            let Some(meshes) = self.meshes.get(&node.id) else {
                continue;
            };
            gl.uniform_matrix4fv_with_f32_array(u.model.as_ref(), false, &node.world.to_cols_array());
            gl.uniform_matrix3fv_with_f32_array(
                u.normal_matrix.as_ref(),
                false,
                &normal_matrix(node.world).to_cols_array(),
            );

            for mesh in meshes {
                gl.uniform4fv_with_f32_array(u.base_color.as_ref(), &mesh.base_color);
                gl.bind_vertex_array(Some(&mesh.vao));
                gl.draw_elements_with_i32(Gl::TRIANGLES, mesh.index_count, Gl::UNSIGNED_INT, 0);
            }
        }
        gl.bind_vertex_array(None);
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        for (_, meshes) in self.meshes.drain() {
            for mesh in meshes {
                mesh.release(&self.gl);
            }
        }
        self.gl.delete_program(Some(&self.program));
    }
}

fn normal_matrix(world: Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(world);
    if linear.determinant().abs() <= f32::EPSILON {
        return Mat3::IDENTITY;
    }
    linear.inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_core::glam::Vec3;

    #[test]
    fn test_mat4_requires_sixteen_values() {
        assert_eq!(mat4(&[0.0; 15]), None);
        let identity = Mat4::IDENTITY.to_cols_array();
        assert_eq!(mat4(&identity), Some(Mat4::IDENTITY));
    }

    #[test]
    fn test_normal_matrix_ignores_translation() {
        let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(normal_matrix(world), Mat3::IDENTITY);
    }

    #[test]
    fn test_normal_matrix_of_degenerate_scale() {
        let world = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(normal_matrix(world), Mat3::IDENTITY);
    }
}
