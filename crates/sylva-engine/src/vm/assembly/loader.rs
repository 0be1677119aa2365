//! Assembly loader
//!
//! Runs the load phases in their fixed order over one [`AssemblyDocument`]:
//!
//! ```text
//! sources -> global buffer -> names -> types -> boxed types -> list flavors
//!   -> map flavors -> invokes -> regexes -> literals -> validators -> constants
//! ```
//!
//! Every phase consumes one array of the document and is a no-op when it is
//! empty. Any failure aborts the load; the partially built program is dropped.

use std::collections::BTreeMap;

use crate::vm::constant::{ConstantEvaluator, Initializer, NoInitializer};
use crate::vm::flavor::{FlavorRegistry, ListFlavor, MapFlavor};
use crate::vm::gc::Heap;
use crate::vm::globals::GlobalStore;
use crate::vm::invoke::{
    BodyInfo, InvokeDecl, InvokeKind, InvokeParam, InvokeTable, PCode, PrimitiveInfo, SourceSpan,
};
use crate::vm::literal::LiteralDecoder;
use crate::vm::names::{NameRegistry, Namespace};
use crate::vm::regex_table::RegexTable;
use crate::vm::types::{
    round_up_to_word, FieldDescriptor, FieldId, FieldLayout, FieldTable, InvokeId, RefMask,
    SizeInfo, TypeDescriptor, TypeId, TypeKind, TypeTable,
};

use super::config::LoaderConfig;
use super::error::{LoadError, LoadPhase, LoadResult};
use super::format::{
    AssemblyDocument, BoxedRecord, InvokeKindRecord, InvokeRecord, ListFlavorRecord,
    MapFlavorRecord, SizeInfoRecord, SpanRecord, TypeKindRecord, TypeRecord,
};
use super::program::{LoadedProgram, SourceMap};

/// Builds a [`LoadedProgram`] from an assembly document.
#[derive(Debug, Clone, Default)]
pub struct AssemblyLoader {
    config: LoaderConfig,
}

impl AssemblyLoader {
    /// Create a loader with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with an explicit configuration.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Parse and load a JSON document. Constants fault without an interpreter.
    pub fn load_str(&self, json: &str) -> LoadResult<LoadedProgram> {
        let doc: AssemblyDocument = serde_json::from_str(json)?;
        self.load_document(doc, &mut NoInitializer)
    }

    /// Parse and load a JSON document from bytes.
    pub fn load_slice(&self, json: &[u8]) -> LoadResult<LoadedProgram> {
        let doc: AssemblyDocument = serde_json::from_slice(json)?;
        self.load_document(doc, &mut NoInitializer)
    }

    /// Load an already parsed JSON value.
    pub fn load_value(&self, value: serde_json::Value) -> LoadResult<LoadedProgram> {
        let doc: AssemblyDocument = serde_json::from_value(value)?;
        self.load_document(doc, &mut NoInitializer)
    }

    /// Load a document, running computed constants through `initializer`.
    pub fn load_document(
        &self,
        doc: AssemblyDocument,
        initializer: &mut dyn Initializer,
    ) -> LoadResult<LoadedProgram> {
        let _span = tracing::debug_span!("load_assembly").entered();
        let verify = self.config.verify_masks;

        enter(LoadPhase::Sources, doc.src.len());
        let mut sources = SourceMap::new();
        if self.config.retain_sources {
            for src in doc.src {
                sources.insert(src.fname, src.contents);
            }
        }

        enter(LoadPhase::GlobalBuffer, doc.cbuffsize as usize);
        let (mut globals, mut heap) = self.init_globals(doc.cbuffsize, &doc.cmask)?;

        enter(LoadPhase::Names, doc.typenames.len());
        let mut names = NameRegistry::new();
        for name in &doc.typenames {
            names.intern_type(name)?;
        }
        for name in &doc.propertynames {
            names.push_property(name);
        }
        for name in &doc.fieldnames {
            names.push_field(name);
        }
        let mut fields = FieldTable::new(names.count(Namespace::Field));
        for rec in &doc.fielddecls {
            let fkey = resolve_field(&names, &rec.fkey, "fielddecls")?;
            let declared_type = resolve_type(&names, &rec.declared_type, &rec.fkey)?;
            fields.insert(FieldDescriptor {
                fkey,
                name: rec.fname.clone(),
                declared_type,
                is_optional: rec.is_optional,
            })?;
        }
        for name in &doc.invokenames {
            names.push_invoke(name);
        }
        for name in &doc.vinvokenames {
            names.push_vinvoke(name);
        }

        enter(LoadPhase::Types, doc.typedecls.len());
        let mut types = TypeTable::new(names.count(Namespace::Type));
        for rec in &doc.typedecls {
            types.insert(build_type(&names, rec, verify)?)?;
        }

        enter(LoadPhase::BoxedTypes, doc.boxeddecls.len());
        for rec in &doc.boxeddecls {
            let desc = build_boxed(&names, &types, rec)?;
            types.insert(desc)?;
        }

        enter(LoadPhase::ListFlavors, doc.listflavors.len());
        let mut flavors = FlavorRegistry::new();
        for rec in &doc.listflavors {
            flavors.register_list(build_list_flavor(&names, &types, rec)?)?;
        }

        enter(LoadPhase::MapFlavors, doc.mapflavors.len());
        for rec in &doc.mapflavors {
            flavors.register_map(build_map_flavor(&names, &types, rec)?)?;
        }

        enter(LoadPhase::Invokes, doc.invdecls.len());
        let mut invokes = InvokeTable::new(names.count(Namespace::Invoke));
        for rec in doc.invdecls {
            invokes.insert(build_invoke(&names, rec, verify)?)?;
        }

        enter(LoadPhase::Regexes, doc.regexes.len());
        let mut regexes = RegexTable::new();
        for rec in &doc.regexes {
            regexes.insert(&rec.restr, &rec.pattern)?;
        }

        enter(LoadPhase::Literals, doc.litdecls.len());
        {
            let mut decoder = LiteralDecoder::new(&mut globals, &mut heap, &types, &regexes);
            for rec in &doc.litdecls {
                let tid = resolve_type(&names, &rec.ty, "litdecls")?;
                decoder
                    .decode(rec.offset, tid, &rec.value)
                    .map_err(|source| LoadError::Literal {
                        offset: rec.offset,
                        ty: rec.ty.clone(),
                        source,
                    })?;
            }
        }

        enter(LoadPhase::Validators, doc.validators.len());
        for rec in &doc.validators {
            let vtype = resolve_type(&names, &rec.vtype, "validators")?;
            regexes.add_validator(vtype, &rec.regex.restr, &rec.regex.pattern)?;
        }

        enter(LoadPhase::Constants, doc.constdecls.len());
        {
            let mut evaluator =
                ConstantEvaluator::new(&invokes, &types, &mut globals, &mut heap, initializer);
            for rec in &doc.constdecls {
                let ikey = resolve_invoke(&names, &rec.invoke, "constdecls")?;
                let tid = resolve_type(&names, &rec.ty, "constdecls")?;
                evaluator
                    .evaluate(rec.offset, ikey, tid)
                    .map_err(|source| LoadError::Constant {
                        offset: rec.offset,
                        source,
                    })?;
            }
        }

        for tid in types.missing() {
            tracing::warn!(
                tid = %tid,
                name = names.type_name(tid).unwrap_or("?"),
                "type name interned but never declared"
            );
        }

        let program = LoadedProgram {
            names,
            sources,
            globals,
            heap,
            types,
            fields,
            flavors,
            invokes,
            regexes,
        };
        tracing::debug!(
            types = program.types.populated(),
            heap_objects = program.heap.allocation_count(),
            "assembly loaded"
        );
        Ok(program)
    }

    fn init_globals(&self, cbuffsize: u64, cmask: &str) -> LoadResult<(GlobalStore, Heap)> {
        let max = self.config.max_global_buffer;
        let size = usize::try_from(cbuffsize)
            .ok()
            .filter(|&size| size <= max)
            .ok_or(LoadError::GlobalBufferTooLarge {
                size: cbuffsize,
                max,
            })?;
        let mask = parse_mask(cmask, "cmask")?;
        if self.config.verify_masks && mask.covered_bytes() > size {
            return Err(LoadError::MaskCoverage {
                context: "cmask".to_string(),
                covered: mask.covered_bytes(),
                expected: format!("at most {size}"),
            });
        }

        let mut heap = Heap::new();
        heap.set_max_heap_size(self.config.max_heap_bytes);
        heap.register_global_roots(size, mask.clone())?;
        Ok((GlobalStore::new(size, mask), heap))
    }
}

fn enter(phase: LoadPhase, count: usize) {
    tracing::debug!(phase = %phase, count, "load phase");
}

fn resolve_type(names: &NameRegistry, name: &str, context: &str) -> LoadResult<TypeId> {
    names.type_id(name).ok_or_else(|| LoadError::UnknownName {
        namespace: Namespace::Type,
        name: name.to_string(),
        context: context.to_string(),
    })
}

fn resolve_field(names: &NameRegistry, name: &str, context: &str) -> LoadResult<FieldId> {
    names.field_id(name).ok_or_else(|| LoadError::UnknownName {
        namespace: Namespace::Field,
        name: name.to_string(),
        context: context.to_string(),
    })
}

fn resolve_invoke(names: &NameRegistry, name: &str, context: &str) -> LoadResult<InvokeId> {
    names.invoke_id(name).ok_or_else(|| LoadError::UnknownName {
        namespace: Namespace::Invoke,
        name: name.to_string(),
        context: context.to_string(),
    })
}

/// Resolve a type name to a descriptor that is already in the table.
fn loaded<'t>(
    names: &NameRegistry,
    types: &'t TypeTable,
    name: &str,
    context: &str,
) -> LoadResult<&'t TypeDescriptor> {
    let tid = resolve_type(names, name, context)?;
    types.get(tid).ok_or_else(|| LoadError::MissingDescriptor {
        name: name.to_string(),
        context: context.to_string(),
    })
}

fn wrong_kind(name: &str, context: &str, expected: &'static str, found: &TypeKind) -> LoadError {
    LoadError::WrongKind {
        name: name.to_string(),
        context: context.to_string(),
        expected,
        found: found.kind_name(),
    }
}

fn parse_mask(text: &str, context: &str) -> LoadResult<RefMask> {
    RefMask::parse(text).map_err(|source| LoadError::InvalidMask {
        context: context.to_string(),
        source,
    })
}

fn build_size(rec: &SizeInfoRecord, context: &str, verify: bool) -> LoadResult<SizeInfo> {
    let inlinedmask = parse_mask(&rec.inlinedmask, context)?;
    let heapmask = rec
        .heapmask
        .as_deref()
        .map(|text| parse_mask(text, context))
        .transpose()?;

    if verify {
        let inline_words = round_up_to_word(rec.inlinedatasize) as usize;
        if inlinedmask.covered_bytes() != inline_words {
            return Err(LoadError::MaskCoverage {
                context: format!("{context} inlinedmask"),
                covered: inlinedmask.covered_bytes(),
                expected: inline_words.to_string(),
            });
        }
        if let Some(mask) = &heapmask {
            let heap_words = round_up_to_word(rec.heapsize) as usize;
            if mask.covered_bytes() > heap_words {
                return Err(LoadError::MaskCoverage {
                    context: format!("{context} heapmask"),
                    covered: mask.covered_bytes(),
                    expected: format!("at most {heap_words}"),
                });
            }
        }
    }

    Ok(SizeInfo {
        heapsize: rec.heapsize,
        inlinedatasize: rec.inlinedatasize,
        assigndatasize: rec.assigndatasize,
        heapmask,
        inlinedmask,
    })
}

fn build_layout(
    names: &NameRegistry,
    tkey: &str,
    fields: &[String],
    offsets: &[u64],
) -> LoadResult<FieldLayout> {
    if fields.len() != offsets.len() {
        return Err(LoadError::InvalidDeclaration {
            name: tkey.to_string(),
            reason: format!(
                "{} fields but {} field offsets",
                fields.len(),
                offsets.len()
            ),
        });
    }
    let fields = fields
        .iter()
        .map(|f| resolve_field(names, f, tkey))
        .collect::<LoadResult<Vec<_>>>()?;
    Ok(FieldLayout {
        fields,
        offsets: offsets.to_vec(),
    })
}

fn resolve_all(names: &NameRegistry, list: &[String], context: &str) -> LoadResult<Vec<TypeId>> {
    list.iter()
        .map(|name| resolve_type(names, name, context))
        .collect()
}

fn build_type(names: &NameRegistry, rec: &TypeRecord, verify: bool) -> LoadResult<TypeDescriptor> {
    let tid = resolve_type(names, &rec.tkey, "typedecls")?;
    let tkey = rec.tkey.as_str();
    let size = build_size(&rec.sizeinfo, tkey, verify)?;
    let kind = match &rec.kind {
        TypeKindRecord::Register => TypeKind::Register,
        TypeKindRecord::Struct {
            fields,
            fieldoffsets,
        } => TypeKind::Struct(build_layout(names, tkey, fields, fieldoffsets)?),
        TypeKindRecord::Ref {
            fields,
            fieldoffsets,
        } => TypeKind::Ref(build_layout(names, tkey, fields, fieldoffsets)?),
        TypeKindRecord::BigNum => TypeKind::BigNum,
        TypeKindRecord::PartialVector {
            entrytype,
            capacity,
        } => {
            if !matches!(capacity, 4 | 8) {
                return Err(LoadError::InvalidDeclaration {
                    name: tkey.to_string(),
                    reason: format!("partial vector capacity {capacity} is not 4 or 8"),
                });
            }
            TypeKind::PartialVector {
                entrytype: resolve_type(names, entrytype, tkey)?,
                capacity: *capacity,
            }
        }
        TypeKindRecord::ListTree { entrytype } => TypeKind::ListTree {
            entrytype: resolve_type(names, entrytype, tkey)?,
        },
        TypeKindRecord::MapTree { keytype, valuetype } => TypeKind::MapTree {
            keytype: resolve_type(names, keytype, tkey)?,
            valuetype: resolve_type(names, valuetype, tkey)?,
        },
        TypeKindRecord::UnionRef { subtypes } => TypeKind::UnionRef {
            subtypes: resolve_all(names, subtypes, tkey)?,
        },
        TypeKindRecord::UnionInline { subtypes } => TypeKind::UnionInline {
            subtypes: resolve_all(names, subtypes, tkey)?,
        },
        TypeKindRecord::UnionUniversal { subtypes } => TypeKind::UnionUniversal {
            subtypes: resolve_all(names, subtypes, tkey)?,
        },
    };
    let name = rec.name.clone().unwrap_or_else(|| rec.tkey.clone());
    tracing::trace!(tid = %tid, name = %name, kind = kind.kind_name(), "declared type");
    Ok(TypeDescriptor::new(tid, name, size, kind))
}

fn build_boxed(
    names: &NameRegistry,
    types: &TypeTable,
    rec: &BoxedRecord,
) -> LoadResult<TypeDescriptor> {
    let tid = resolve_type(names, &rec.tkey, "boxeddecls")?;
    let inner = loaded(names, types, &rec.oftype, &rec.tkey)?;
    if !matches!(inner.kind, TypeKind::Struct(_)) {
        return Err(wrong_kind(&rec.oftype, &rec.tkey, "Struct", &inner.kind));
    }
    let heapmask = inner
        .inline_has_pointers()
        .then(|| inner.size.inlinedmask.clone());
    let size = SizeInfo::reference(inner.size.inlinedatasize, heapmask);
    Ok(TypeDescriptor::new(
        tid,
        rec.name.clone(),
        size,
        TypeKind::BoxedStruct { oftype: inner.tid },
    ))
}

fn partial_vector(
    names: &NameRegistry,
    types: &TypeTable,
    name: &str,
    capacity: u32,
    context: &str,
) -> LoadResult<TypeId> {
    let desc = loaded(names, types, name, context)?;
    match desc.kind {
        TypeKind::PartialVector { capacity: c, .. } if c == capacity => Ok(desc.tid),
        TypeKind::PartialVector { capacity: c, .. } => Err(LoadError::InvalidDeclaration {
            name: context.to_string(),
            reason: format!("{name} has capacity {c}, expected {capacity}"),
        }),
        ref other => Err(wrong_kind(name, context, "PartialVector", other)),
    }
}

fn build_list_flavor(
    names: &NameRegistry,
    types: &TypeTable,
    rec: &ListFlavorRecord,
) -> LoadResult<ListFlavor> {
    let ctx = rec.ltype.as_str();
    let ltype = resolve_type(names, &rec.ltype, "listflavors")?;
    let reprtype = resolve_type(names, &rec.reprtype, ctx)?;
    let entrytype = loaded(names, types, &rec.entrytype, ctx)?.tid;
    let pv4type = partial_vector(names, types, &rec.pv4type, 4, ctx)?;
    let pv8type = partial_vector(names, types, &rec.pv8type, 8, ctx)?;
    let tree = loaded(names, types, &rec.treetype, ctx)?;
    if !matches!(tree.kind, TypeKind::ListTree { .. }) {
        return Err(wrong_kind(&rec.treetype, ctx, "ListTree", &tree.kind));
    }
    Ok(ListFlavor {
        ltype,
        reprtype,
        entrytype,
        pv4type,
        pv8type,
        treetype: tree.tid,
    })
}

fn build_map_flavor(
    names: &NameRegistry,
    types: &TypeTable,
    rec: &MapFlavorRecord,
) -> LoadResult<MapFlavor> {
    let ctx = rec.ltype.as_str();
    let mtype = resolve_type(names, &rec.ltype, "mapflavors")?;
    let reprtype = resolve_type(names, &rec.reprtype, ctx)?;
    let keytype = loaded(names, types, &rec.keytype, ctx)?.tid;
    let valuetype = loaded(names, types, &rec.valuetype, ctx)?.tid;
    let tupletype = loaded(names, types, &rec.tupletype, ctx)?.tid;
    let tree = loaded(names, types, &rec.treetype, ctx)?;
    if !matches!(tree.kind, TypeKind::MapTree { .. }) {
        return Err(wrong_kind(&rec.treetype, ctx, "MapTree", &tree.kind));
    }
    Ok(MapFlavor {
        mtype,
        reprtype,
        keytype,
        valuetype,
        tupletype,
        treetype: tree.tid,
    })
}

fn span(rec: SpanRecord) -> SourceSpan {
    SourceSpan {
        line: rec.line,
        column: rec.column,
        pos: rec.pos,
        span: rec.span,
    }
}

fn build_invoke(names: &NameRegistry, rec: InvokeRecord, verify: bool) -> LoadResult<InvokeDecl> {
    let ikey = resolve_invoke(names, &rec.ikey, "invdecls")?;
    let ctx = rec.ikey.as_str();
    let params = rec
        .params
        .iter()
        .map(|p| {
            Ok(InvokeParam {
                name: p.name.clone(),
                ptype: resolve_type(names, &p.ptype, ctx)?,
            })
        })
        .collect::<LoadResult<Vec<_>>>()?;
    let result_type = resolve_type(names, &rec.result_type, ctx)?;

    let kind = match rec.kind {
        InvokeKindRecord::Body {
            is_user_code,
            scalarstack_bytes,
            mixedstack_bytes,
            mixed_mask,
            mask_slots,
            argmask_size,
            paraminfo,
            result_arg,
            body,
        } => {
            let mixed_mask = parse_mask(&mixed_mask, ctx)?;
            if verify && mixed_mask.covered_bytes() as u64 > round_up_to_word(mixedstack_bytes) {
                return Err(LoadError::MaskCoverage {
                    context: format!("{ctx} mixedMask"),
                    covered: mixed_mask.covered_bytes(),
                    expected: format!("at most {}", round_up_to_word(mixedstack_bytes)),
                });
            }
            InvokeKind::Body(BodyInfo {
                is_user_code,
                scalarstack_bytes,
                mixedstack_bytes,
                mixed_mask,
                mask_slots,
                argmask_size,
                paraminfo,
                result_arg,
                ops: body,
            })
        }
        InvokeKindRecord::Primitive {
            enclosingtype,
            implkeyname,
            binds,
            pcodes,
        } => {
            let enclosingtype = enclosingtype
                .as_deref()
                .map(|t| resolve_type(names, t, ctx))
                .transpose()?;
            let binds = binds
                .iter()
                .map(|(k, t)| Ok((k.clone(), resolve_type(names, t, ctx)?)))
                .collect::<LoadResult<BTreeMap<_, _>>>()?;
            let pcodes = pcodes
                .into_iter()
                .map(|(k, pc)| {
                    let code = resolve_invoke(names, &pc.code, ctx)?;
                    Ok((
                        k,
                        PCode {
                            code,
                            cargpos: pc.cargpos,
                        },
                    ))
                })
                .collect::<LoadResult<BTreeMap<_, _>>>()?;
            InvokeKind::Primitive(PrimitiveInfo {
                enclosingtype,
                implkeyname,
                binds,
                pcodes,
            })
        }
    };

    Ok(InvokeDecl {
        ikey,
        name: rec.name,
        src_file: rec.src_file,
        start: span(rec.sinfo_start),
        end: span(rec.sinfo_end),
        recursive: rec.recursive,
        params,
        result_type,
        kind,
    })
}
