//! Node type registry and program persistence
//!
//! The registry is the process-wide catalogue mapping node type names to
//! their [`NodeSpec`] templates and behavior factories, plus the stable
//! small-integer ids the persisted form uses (ids 0–9 are reserved for
//! the structural kinds; registered types count up from 10). It is also
//! the owner of save/load: programs are flattened into the tagged record
//! stream of [`codec`](crate::codec) and rebuilt from it, deferring bond
//! resolution until every referenced node exists.
//!
//! The registry is an explicit value passed to the factory calls that
//! need it, not ambient state: build it, register node types, then hand
//! out `&Registry` (or wrap it in an `Arc` for multi-program hosts).

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::codec::{Reader, ValueDecoder, Writer};
use crate::error::{EngineError, Result};
use crate::node::{
    Node, NodeId, FIRST_USER_KIND, KIND_ENTRY, KIND_GET_VARIABLE, KIND_RETURN, KIND_SET_VARIABLE,
    KIND_VALUE,
};
use crate::node_type::{Behavior, BehaviorFactory, NodeSpec};
use crate::program::{Program, ENTRY_NODE, RETURN_TYPE_NAME};
use crate::value::{TypeTag, Value};

/// One-byte record codes of the persisted graph format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum RecordCode {
    /// Begin a run of node instances of one named type
    TypeGroup = 0,
    /// One node instance id of the current type run
    NodeInstance = 1,
    /// A literal node and its preset output
    ValueNode = 2,
    /// The entry node's parameter types
    Parameters = 3,
    /// One control-flow bond
    TriggerBond = 4,
    /// One data bond
    DataBond = 5,
    /// The program's declared return type
    ReturnType = 6,
    /// Classification tags
    Tags = 7,
    /// A variable-get node and its output type
    GetVariable = 8,
    /// A variable-set node and its input type
    SetVariable = 9,
}

impl TryFrom<u8> for RecordCode {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            0 => Ok(Self::TypeGroup),
            1 => Ok(Self::NodeInstance),
            2 => Ok(Self::ValueNode),
            3 => Ok(Self::Parameters),
            4 => Ok(Self::TriggerBond),
            5 => Ok(Self::DataBond),
            6 => Ok(Self::ReturnType),
            7 => Ok(Self::Tags),
            8 => Ok(Self::GetVariable),
            9 => Ok(Self::SetVariable),
            other => Err(other),
        }
    }
}

/// A registration entry: the node template plus its behavior factory.
struct RegistryEntry {
    spec: NodeSpec,
    factory: Arc<dyn BehaviorFactory>,
}

/// Wraps a plain closure as a [`BehaviorFactory`].
struct ClosureFactory<F>(F);

impl<F> BehaviorFactory for ClosureFactory<F>
where
    F: Fn() -> Option<Box<dyn Behavior>> + Send + Sync,
{
    fn create(&self) -> Option<Box<dyn Behavior>> {
        (self.0)()
    }
}

/// Catalogue of node types, factory for programs, owner of persistence.
pub struct Registry {
    entries: HashMap<String, RegistryEntry>,
    ids: HashMap<String, u32>,
    names: HashMap<u32, String>,
    next_id: u32,
    decoders: HashMap<String, ValueDecoder>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            ids: HashMap::new(),
            names: HashMap::new(),
            next_id: FIRST_USER_KIND,
            decoders: HashMap::new(),
        }
    }

    /// Register a node type with its behavior factory.
    ///
    /// Re-registering a name replaces the template and factory but keeps
    /// the previously assigned persistence id.
    pub fn register(&mut self, spec: NodeSpec, factory: Arc<dyn BehaviorFactory>) {
        let name = spec.name.clone();
        if !self.ids.contains_key(&name) {
            let id = self.next_id;
            self.next_id += 1;
            self.ids.insert(name.clone(), id);
            self.names.insert(id, name.clone());
        }
        self.entries.insert(name, RegistryEntry { spec, factory });
    }

    /// Register a node type backed by a behavior-producing closure.
    pub fn register_fn<F>(&mut self, spec: NodeSpec, factory: F)
    where
        F: Fn() -> Option<Box<dyn Behavior>> + Send + Sync + 'static,
    {
        self.register(spec, Arc::new(ClosureFactory(factory)));
    }

    /// Register the decoder for a custom value type, keyed by its stable
    /// type name.
    pub fn register_value_codec(&mut self, type_name: impl Into<String>, decoder: ValueDecoder) {
        self.decoders.insert(type_name.into(), decoder);
    }

    pub fn has_node_type(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The template registered under a name.
    pub fn node_spec(&self, name: &str) -> Option<&NodeSpec> {
        self.entries.get(name).map(|e| &e.spec)
    }

    /// All registered node type names.
    pub fn node_types(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Create a fresh program with the given signature.
    pub fn new_program(
        &self,
        return_type: Option<TypeTag>,
        parameter_types: Vec<TypeTag>,
    ) -> Program {
        Program::new(return_type, parameter_types)
    }

    /// Instantiate a node of a registered type, with a fresh behavior.
    pub(crate) fn new_node(&self, name: &str, id: NodeId) -> Option<Node> {
        let entry = self.entries.get(name)?;
        let type_id = *self.ids.get(name)?;
        let spec = &entry.spec;
        Some(Node::new(
            id,
            type_id,
            spec.can_be_entry,
            spec.triggers.len(),
            spec.inputs.iter().map(|p| p.ty.clone()).collect(),
            spec.outputs.iter().map(|p| p.ty.clone()).collect(),
            entry.factory.create(),
        ))
    }

    /// Persist a program to a file.
    pub fn save(&self, path: impl AsRef<Path>, program: &Program) -> Result<()> {
        self.encode_program(program).save(path)
    }

    /// Persist a program, additionally XORing the whole file with a
    /// password-derived keystream.
    pub fn save_with_password(
        &self,
        path: impl AsRef<Path>,
        program: &Program,
        password: &str,
    ) -> Result<()> {
        self.encode_program(program).save_with_password(path, password)
    }

    /// Load a program from a file.
    ///
    /// Nodes of unregistered types are skipped with a warning, as are
    /// bonds referencing skipped nodes; truncated or malformed streams
    /// are errors.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Program> {
        let mut reader = Reader::open(path)?;
        self.decode_program(&mut reader)
    }

    /// Load a password-obfuscated program file.
    pub fn load_with_password(&self, path: impl AsRef<Path>, password: &str) -> Result<Program> {
        let mut reader = Reader::open_with_password(path, password)?;
        self.decode_program(&mut reader)
    }

    fn encode_program(&self, program: &Program) -> Writer {
        // Group node ids per type name so each name is written once;
        // BTreeMap keeps the output deterministic.
        let mut named: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        let mut value_nodes: Vec<(NodeId, Value)> = Vec::new();
        let mut get_nodes: Vec<(NodeId, TypeTag)> = Vec::new();
        let mut set_nodes: Vec<(NodeId, TypeTag)> = Vec::new();
        let mut trigger_bonds: Vec<(NodeId, u8, NodeId)> = Vec::new();
        let mut data_bonds: Vec<(NodeId, u8, NodeId, u8)> = Vec::new();

        for node in program.nodes_iter() {
            trigger_bonds.extend(node.trigger_bonds());
            data_bonds.extend(node.data_bonds());
            match node.type_id() {
                KIND_VALUE => match node.output_value(0) {
                    Some(value) => value_nodes.push((node.id(), value.clone())),
                    None => log::warn!("value node {} has no preset output; skipped", node.id()),
                },
                KIND_ENTRY => {}
                KIND_RETURN => named
                    .entry(RETURN_TYPE_NAME.to_string())
                    .or_default()
                    .push(node.id()),
                KIND_GET_VARIABLE => {
                    if let Some(ty) = node.output_type(0) {
                        get_nodes.push((node.id(), ty.clone()));
                    }
                }
                KIND_SET_VARIABLE => {
                    if let Some(ty) = node.input_type(0) {
                        set_nodes.push((node.id(), ty.clone()));
                    }
                }
                other => match self.names.get(&other) {
                    Some(name) => named.entry(name.clone()).or_default().push(node.id()),
                    None => {
                        log::warn!("node {} has unregistered type id {other}; skipped", node.id())
                    }
                },
            }
        }

        let mut writer = Writer::new();
        for (name, ids) in &named {
            writer.write_u8(RecordCode::TypeGroup as u8);
            writer.write_str(name);
            for &id in ids {
                writer.write_u8(RecordCode::NodeInstance as u8);
                writer.write_u32(id);
            }
        }
        for (id, value) in &value_nodes {
            writer.write_u8(RecordCode::ValueNode as u8);
            writer.write_u32(*id);
            writer.write_value(value);
        }
        if !program.parameter_types().is_empty() {
            writer.write_u8(RecordCode::Parameters as u8);
            writer.write_i32(program.parameter_types().len() as i32);
            for ty in program.parameter_types() {
                writer.write_type(ty);
            }
        }
        for (from, slot, to) in &trigger_bonds {
            writer.write_u8(RecordCode::TriggerBond as u8);
            writer.write_u32(*from);
            writer.write_u8(*slot);
            writer.write_u32(*to);
        }
        for (from, output, to, input) in &data_bonds {
            writer.write_u8(RecordCode::DataBond as u8);
            writer.write_u32(*from);
            writer.write_u8(*output);
            writer.write_u32(*to);
            writer.write_u8(*input);
        }
        if let Some(ty) = program.return_type() {
            writer.write_u8(RecordCode::ReturnType as u8);
            writer.write_type(ty);
        }
        if !program.tags().is_empty() {
            let mut tags: Vec<i32> = program.tags().iter().copied().collect();
            tags.sort_unstable();
            writer.write_u8(RecordCode::Tags as u8);
            writer.write_i32(tags.len() as i32);
            for tag in tags {
                writer.write_i32(tag);
            }
        }
        for (id, ty) in &get_nodes {
            writer.write_u8(RecordCode::GetVariable as u8);
            writer.write_u32(*id);
            writer.write_type(ty);
        }
        for (id, ty) in &set_nodes {
            writer.write_u8(RecordCode::SetVariable as u8);
            writer.write_u32(*id);
            writer.write_type(ty);
        }
        writer
    }

    fn decode_program(&self, reader: &mut Reader) -> Result<Program> {
        let mut current_type = String::new();
        let mut named: Vec<(String, u32)> = Vec::new();
        let mut value_nodes: Vec<(u32, Value)> = Vec::new();
        let mut get_nodes: Vec<(u32, TypeTag)> = Vec::new();
        let mut set_nodes: Vec<(u32, TypeTag)> = Vec::new();
        let mut parameter_types: Vec<TypeTag> = Vec::new();
        let mut return_type: Option<TypeTag> = None;
        let mut trigger_bonds: Vec<(u32, u8, u32)> = Vec::new();
        let mut data_bonds: Vec<(u32, u8, u32, u8)> = Vec::new();
        let mut tags: Vec<i32> = Vec::new();

        while reader.has_more() {
            let code = reader.read_u8()?;
            let code = RecordCode::try_from(code).map_err(EngineError::UnknownRecord)?;
            match code {
                RecordCode::TypeGroup => current_type = reader.read_str()?,
                RecordCode::NodeInstance => {
                    named.push((current_type.clone(), reader.read_u32()?));
                }
                RecordCode::ValueNode => {
                    let id = reader.read_u32()?;
                    let value = reader.read_value(&self.decoders)?;
                    value_nodes.push((id, value));
                }
                RecordCode::Parameters => {
                    let count = reader.read_i32()?;
                    if count < 0 {
                        return Err(EngineError::corrupt(format!(
                            "negative parameter count {count}"
                        )));
                    }
                    for _ in 0..count {
                        parameter_types.push(reader.read_type()?);
                    }
                }
                RecordCode::TriggerBond => {
                    trigger_bonds.push((reader.read_u32()?, reader.read_u8()?, reader.read_u32()?));
                }
                RecordCode::DataBond => {
                    data_bonds.push((
                        reader.read_u32()?,
                        reader.read_u8()?,
                        reader.read_u32()?,
                        reader.read_u8()?,
                    ));
                }
                RecordCode::ReturnType => return_type = Some(reader.read_type()?),
                RecordCode::Tags => {
                    let count = reader.read_i32()?;
                    if count < 0 {
                        return Err(EngineError::corrupt(format!("negative tag count {count}")));
                    }
                    for _ in 0..count {
                        tags.push(reader.read_i32()?);
                    }
                }
                RecordCode::GetVariable => {
                    let id = reader.read_u32()?;
                    get_nodes.push((id, reader.read_type()?));
                }
                RecordCode::SetVariable => {
                    let id = reader.read_u32()?;
                    set_nodes.push((id, reader.read_type()?));
                }
            }
        }

        let mut program = self.new_program(return_type, parameter_types);
        // File ids are arbitrary; map them onto the fresh arena. Id 0 is
        // always the implicit entry node.
        let mut id_map: HashMap<u32, NodeId> = HashMap::from([(0, ENTRY_NODE)]);

        for (name, file_id) in named {
            match program.new_node(self, &name) {
                Some(id) => {
                    id_map.insert(file_id, id);
                }
                None => log::warn!("unknown node type '{name}'; node {file_id} skipped"),
            }
        }
        for (file_id, value) in value_nodes {
            let id = program.new_value_node(value);
            id_map.insert(file_id, id);
        }
        for (file_id, ty) in get_nodes {
            let id = program.new_get_variable_node(ty);
            id_map.insert(file_id, id);
        }
        for (file_id, ty) in set_nodes {
            let id = program.new_set_variable_node(ty);
            id_map.insert(file_id, id);
        }
        for tag in tags {
            program.add_tag(tag);
        }

        // Bonds resolve only now, after every surviving node exists.
        for (from, slot, to) in trigger_bonds {
            match (id_map.get(&from), id_map.get(&to)) {
                (Some(&f), Some(&t)) => {
                    if !program.bond(f, slot, t) {
                        log::warn!("trigger bond {from}:{slot} -> {to} could not be re-created");
                    }
                }
                _ => log::warn!("trigger bond {from}:{slot} -> {to} references a skipped node"),
            }
        }
        for (from, output, to, input) in data_bonds {
            match (id_map.get(&from), id_map.get(&to)) {
                (Some(&f), Some(&t)) => {
                    if !program.bond_data(f, output, t, input) {
                        log::warn!(
                            "data bond {from}:{output} -> {to}:{input} could not be re-created"
                        );
                    }
                }
                _ => {
                    log::warn!("data bond {from}:{output} -> {to}:{input} references a skipped node")
                }
            }
        }

        Ok(program)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
