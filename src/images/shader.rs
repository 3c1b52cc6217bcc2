/// A shader program as this layer sees it: source text plus the uniform-block
/// reflection data a compiled program reports.
///
/// Compilation itself happens elsewhere; this type only carries what uniform
/// buffers need to resolve a named block: the block's driver-assigned binding
/// index, its byte size, and the byte offset of each named member.
///
/// # Examples
///
/// ```
/// use handles_and_slots::images::shader::Shader;
///
/// let mut shader = Shader::new(
///     "void main() { /* vertex */ }".to_string(),
///     "void main() { /* fragment */ }".to_string(),
/// );
/// let binding = shader.declare_block("Matrices", 96);
/// shader.declare_member("Matrices", "worldView", 0, 64).unwrap();
/// shader.declare_member("Matrices", "projection", 64, 32).unwrap();
///
/// assert_eq!(shader.block("Matrices").unwrap().binding(), binding);
/// assert!(shader.block("Lights").is_err());
/// ```
#[derive(Debug)]
pub struct Shader {
    //may need additional type design for future backends
    vertex_code: String,
    fragment_code: String,
    blocks: Vec<UniformBlockLayout>,
}

/// A named uniform block, or one of its members, does not exist.
///
/// Non-recoverable for the buffer instance that asked; fix the name or the
/// shader.
#[derive(Debug, thiserror::Error)]
pub enum BlockNotFoundError {
    #[error("shader declares no uniform block named `{0}`")]
    Block(String),
    #[error("uniform block declares no member named `{0}`")]
    Member(String),
}

/// The reflected layout of one named uniform block.
#[derive(Debug, Clone)]
pub struct UniformBlockLayout {
    name: String,
    byte_size: u32,
    binding: u32,
    members: Vec<BlockMember>,
}

/// One named member inside a uniform block: its byte offset and size.
#[derive(Debug, Clone)]
pub struct BlockMember {
    name: String,
    offset: u32,
    size: u32,
}

impl BlockMember {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

impl UniformBlockLayout {
    /// The binding index the driver assigned to this block.
    pub fn binding(&self) -> u32 {
        self.binding
    }

    pub fn byte_size(&self) -> u32 {
        self.byte_size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a member by name.
    pub fn member(&self, name: &str) -> Result<&BlockMember, BlockNotFoundError> {
        self.members
            .iter()
            .find(|member| member.name == name)
            .ok_or_else(|| BlockNotFoundError::Member(name.to_string()))
    }
}

impl Shader {
    pub fn new(vertex_code: String, fragment_code: String) -> Self {
        Self {
            vertex_code,
            fragment_code,
            blocks: Vec::new(),
        }
    }

    pub fn vertex_code(&self) -> &str {
        &self.vertex_code
    }

    pub fn fragment_code(&self) -> &str {
        &self.fragment_code
    }

    /// Records a uniform block the program declares and returns the binding
    /// index the driver assigned to it.
    ///
    /// Indices are assigned sequentially per program, the way block indices
    /// come back from program reflection.
    pub fn declare_block(&mut self, name: &str, byte_size: u32) -> u32 {
        let binding = self.blocks.len() as u32;
        self.blocks.push(UniformBlockLayout {
            name: name.to_string(),
            byte_size,
            binding,
            members: Vec::new(),
        });
        binding
    }

    /// Records a named member of a previously declared block.
    pub fn declare_member(
        &mut self,
        block: &str,
        member: &str,
        offset: u32,
        size: u32,
    ) -> Result<(), BlockNotFoundError> {
        let layout = self
            .blocks
            .iter_mut()
            .find(|candidate| candidate.name == block)
            .ok_or_else(|| BlockNotFoundError::Block(block.to_string()))?;
        layout.members.push(BlockMember {
            name: member.to_string(),
            offset,
            size,
        });
        Ok(())
    }

    /// Looks up a block by name.
    pub fn block(&self, name: &str) -> Result<&UniformBlockLayout, BlockNotFoundError> {
        self.blocks
            .iter()
            .find(|block| block.name == name)
            .ok_or_else(|| BlockNotFoundError::Block(name.to_string()))
    }
}
