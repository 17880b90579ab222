use crate::host::{MeshShape, SceneNode};
use crate::retained::RetainedScene;

/// Produces output from a retained scene. Renderers only read the scene.
pub trait SceneRenderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of the given scene.
    fn render(&self, scene: &RetainedScene) -> Self::Output;
}

/// Human-readable dump of a retained scene, one line per object.
///
/// Useful for CLI output, logging, and testing the scene interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl SceneRenderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &RetainedScene) -> String {
        let mut out = String::new();
        let c = scene.clear_color();
        out.push_str(&format!(
            "=== Scene (objects={}, materials={}) ===\n",
            scene.len(),
            scene.material_count()
        ));
        out.push_str(&format!(
            "Clear: ({:.2}, {:.2}, {:.2}, {:.2})\n",
            c.r, c.g, c.b, c.a
        ));

        for (id, obj) in scene.objects() {
            let detail = match &obj.node {
                SceneNode::HemisphericLight { intensity, .. } => {
                    format!("hemispheric intensity={intensity:.2}")
                }
                SceneNode::PointLight { position, intensity } => format!(
                    "point pos=({:.2}, {:.2}, {:.2}) intensity={intensity:.2}",
                    position.x, position.y, position.z
                ),
                SceneNode::Camera(cam) => {
                    let eye = cam.position();
                    let controlled = if scene.controlled_camera() == Some(*id) {
                        " [control]"
                    } else {
                        ""
                    };
                    format!(
                        "camera alpha={:.2} beta={:.2} radius={:.1} eye=({:.2}, {:.2}, {:.2}){controlled}",
                        cam.alpha, cam.beta, cam.radius, eye.x, eye.y, eye.z
                    )
                }
                SceneNode::Mesh(desc) => {
                    let p = desc.transform.position;
                    let shape = match desc.shape {
                        MeshShape::Box { size } => format!("box({size:.1})"),
                        MeshShape::Sphere { diameter, .. } => format!("sphere({diameter:.1})"),
                    };
                    format!("mesh {shape} pos=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)
                }
            };
            out.push_str(&format!("  [{}] {} {}\n", id.short(), obj.name, detail));
        }

        out
    }
}
