//! Analysis session: the owned context every core operation runs against.
//!
//! A [`Session`] owns the image stack, the mask engine, all ROIs, the three
//! navigable collections (branches, polygons, pixel ROIs), the trace cache,
//! the selection, the hold slots and the render gate. Nothing is global, so
//! independent sessions can coexist.
//!
//! Every mutating operation runs inside a render batch: the rendering
//! collaborator sees one redraw per call, never an intermediate state.
//! Operations that fail leave the session as it was.
use crate::config::SessionConfig;
use crate::cyclic::CyclicList;
use crate::edit::{self, EditOutcome, JoinDirection};
use crate::error::{RoiError, RoiResult};
use crate::image::{ImageF32, Stack};
use crate::mask::{percentile, Mask, MaskEngine};
use crate::render::{RenderBatch, RenderGate, RenderSink};
use crate::roi::{
    BranchRoi, ControlPoint, Path, PixelRoi, PolygonRoi, Roi, RoiArena, RoiId, RoiKind,
};
use crate::selection::{Selected, Selection};
use crate::skeleton::Skeleton;
use crate::trace::{mean_trace, HeldTrace, HoldSlots, PostProcess, Trace, TraceCache};
use log::{debug, warn};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Collection {
    Branches,
    Polygons,
    Pixels,
}

#[derive(Debug)]
pub struct Session {
    stack: Stack,
    masks: MaskEngine,
    arena: RoiArena,
    branches: CyclicList<RoiId>,
    polygons: CyclicList<RoiId>,
    pixel_rois: CyclicList<RoiId>,
    cache: TraceCache,
    selection: Selection,
    holds: HoldSlots,
    postprocess: PostProcess,
    active_frame: usize,
    render: Rc<RenderGate>,
}

impl Session {
    /// Build a session over `stack`. Without `mean`, the mean image is the
    /// average over frames. The initial threshold is the configured
    /// percentile of the mean image.
    pub fn new(stack: Stack, mean: Option<ImageF32>, config: &SessionConfig) -> RoiResult<Self> {
        let mean = match mean {
            Some(m) if m.w != stack.w || m.h != stack.h => {
                return Err(RoiError::ShapeMismatch {
                    expected: vec![stack.h, stack.w],
                    actual: vec![m.h, m.w],
                })
            }
            Some(m) => m,
            None => stack.mean_image(),
        };
        let threshold = percentile(&mean.data, config.threshold_percentile);
        debug!(
            "Session::new shape={:?} threshold={threshold:.4}",
            stack.shape()
        );
        let masks = MaskEngine::new(mean, threshold, config.foreground_factor);
        Ok(Self {
            stack,
            masks,
            arena: RoiArena::new(),
            branches: CyclicList::new(),
            polygons: CyclicList::new(),
            pixel_rois: CyclicList::new(),
            cache: TraceCache::new(),
            selection: Selection::new(),
            holds: HoldSlots::new(config.hold_slots),
            postprocess: config.postprocess,
            active_frame: 0,
            render: RenderGate::detached(),
        })
    }

    /// Route redraw notifications to `sink`.
    pub fn with_renderer(self, sink: impl RenderSink + 'static) -> Self {
        self.render.replace_sink(Box::new(sink));
        self
    }

    pub fn render_gate(&self) -> &Rc<RenderGate> {
        &self.render
    }

    /// Open a render batch spanning several session calls.
    #[must_use = "the batch ends as soon as the guard is dropped"]
    pub fn batch(&self) -> RenderBatch {
        self.render.batch()
    }

    // --- Accessors -----------------------------------------------------------

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn frames(&self) -> usize {
        self.stack.frames
    }

    pub fn mean(&self) -> &ImageF32 {
        self.masks.mean()
    }

    pub fn mask(&self) -> &Mask {
        self.masks.mask()
    }

    pub fn threshold(&self) -> f64 {
        self.masks.threshold()
    }

    pub fn rois(&self) -> &RoiArena {
        &self.arena
    }

    pub fn roi(&self, id: RoiId) -> RoiResult<&Roi> {
        self.arena.get(id)
    }

    pub fn branch(&self, id: RoiId) -> RoiResult<&BranchRoi> {
        self.arena.branch(id)
    }

    pub fn branches(&self) -> &CyclicList<RoiId> {
        &self.branches
    }

    pub fn polygons(&self) -> &CyclicList<RoiId> {
        &self.polygons
    }

    pub fn pixel_rois(&self) -> &CyclicList<RoiId> {
        &self.pixel_rois
    }

    pub fn cache(&self) -> &TraceCache {
        &self.cache
    }

    pub fn active_frame(&self) -> usize {
        self.active_frame
    }

    pub fn postprocess(&self) -> PostProcess {
        self.postprocess
    }

    fn list_mut(&mut self, which: Collection) -> &mut CyclicList<RoiId> {
        match which {
            Collection::Branches => &mut self.branches,
            Collection::Polygons => &mut self.polygons,
            Collection::Pixels => &mut self.pixel_rois,
        }
    }

    fn owner(&self, id: RoiId) -> Option<Collection> {
        if self.branches.contains(&id) {
            Some(Collection::Branches)
        } else if self.polygons.contains(&id) {
            Some(Collection::Polygons)
        } else if self.pixel_rois.contains(&id) {
            Some(Collection::Pixels)
        } else {
            None
        }
    }

    // --- Adding and removing ROIs ---------------------------------------------

    /// Add a skeleton branch. Paths with fewer than two points are rejected.
    pub fn add_branch(&mut self, points: Vec<ControlPoint>) -> RoiResult<RoiId> {
        if points.len() < 2 {
            return Err(RoiError::InvalidArgument(format!(
                "branch needs at least 2 control points, got {}",
                points.len()
            )));
        }
        let _batch = self.render.batch();
        let id = self.arena.insert(Roi::Branch(BranchRoi::new(points)));
        self.branches.append(id);
        debug!("Session::add_branch {id:?}");
        Ok(id)
    }

    /// Add every usable branch of `skeleton`; short ones are skipped. Selects
    /// the current branch if nothing was selected.
    pub fn add_skeleton(&mut self, skeleton: &Skeleton) -> RoiResult<Vec<RoiId>> {
        let _batch = self.render.batch();
        let mut added = Vec::with_capacity(skeleton.branches.len());
        for (i, points) in skeleton.branches.iter().enumerate() {
            match self.add_branch(points.clone()) {
                Ok(id) => added.push(id),
                Err(err) => warn!("Session::add_skeleton skipping branch {i}: {err}"),
            }
        }
        if self.selection.current() == Selected::None {
            let first = self.branches.cur().copied();
            self.set_active(first)?;
        }
        Ok(added)
    }

    /// Add a freehand polygon and make it active.
    pub fn add_polygon(&mut self, outline: Vec<[f64; 2]>) -> RoiResult<RoiId> {
        let _batch = self.render.batch();
        let id = self.arena.insert(Roi::Polygon(PolygonRoi::new(outline)));
        self.polygons.append(id);
        self.set_active(Some(id))?;
        Ok(id)
    }

    /// Add a pixel ROI and make it active.
    pub fn add_pixel_roi(&mut self, pixels: impl IntoIterator<Item = (i64, i64)>) -> RoiResult<RoiId> {
        let _batch = self.render.batch();
        let id = self.arena.insert(Roi::Pixel(PixelRoi::new(pixels)));
        self.pixel_rois.append(id);
        self.set_active(Some(id))?;
        Ok(id)
    }

    /// Detach `id` from its collection, the cache, the hold slots and the
    /// selection. Removing a branch removes its segments. If `id` was active
    /// nothing is active afterwards.
    ///
    /// Only branches, polygons and pixel ROIs are managed here; segments are
    /// edited through split/join.
    pub fn remove_roi(&mut self, id: RoiId) -> RoiResult<()> {
        let which = self.owner(id).ok_or(RoiError::NotManaged(id))?;
        let _batch = self.render.batch();
        self.list_mut(which).remove(&id)?;
        self.selection.forget(&mut self.arena, id);
        if let Some(Roi::Branch(branch)) = self.arena.remove(id) {
            for child in branch.children {
                self.detach(child);
            }
        }
        self.detach(id);
        debug!("Session::remove_roi {id:?} from {which:?}");
        Ok(())
    }

    fn detach(&mut self, id: RoiId) {
        self.arena.remove(id);
        self.cache.invalidate(id);
        self.holds.release_roi(id);
    }

    /// Remove the active polygon, pixel ROI or branch (the parent, when a
    /// segment is active) and select the next element of its collection.
    pub fn remove_active(&mut self) -> RoiResult<Option<RoiId>> {
        let (id, which) = match self.selection.current() {
            Selected::None => return Ok(None),
            Selected::Branch(id) | Selected::Segment { parent: id, .. } => {
                (id, Collection::Branches)
            }
            Selected::Polygon(id) => (id, Collection::Polygons),
            Selected::Pixel(id) => (id, Collection::Pixels),
        };
        let _batch = self.render.batch();
        self.remove_roi(id)?;
        let next = self.list_mut(which).cur().copied();
        self.set_active(next)?;
        Ok(next)
    }

    // --- Selection -------------------------------------------------------------

    pub fn selected(&self) -> Selected {
        self.selection.current()
    }

    pub fn active_roi(&self) -> Option<RoiId> {
        self.selection.current().id()
    }

    pub fn active_branch(&self) -> Option<RoiId> {
        self.selection.current().branch()
    }

    pub fn active_segment(&self) -> Option<RoiId> {
        self.selection.current().segment()
    }

    pub fn active_polygon(&self) -> Option<RoiId> {
        self.selection.current().polygon()
    }

    pub fn active_pixel_roi(&self) -> Option<RoiId> {
        self.selection.current().pixel()
    }

    /// Select `target` (or nothing). The owning collection's cursor follows
    /// the selection.
    pub fn set_active(&mut self, target: Option<RoiId>) -> RoiResult<()> {
        let _batch = self.render.batch();
        if !self.selection.set_active(&mut self.arena, target)? {
            return Ok(());
        }
        let (list, id) = match self.selection.current() {
            Selected::None => return Ok(()),
            Selected::Branch(id) | Selected::Segment { parent: id, .. } => {
                (Collection::Branches, id)
            }
            Selected::Polygon(id) => (Collection::Polygons, id),
            Selected::Pixel(id) => (Collection::Pixels, id),
        };
        // Ids inside a collection always seek; anything else keeps the cursor.
        let _ = self.list_mut(list).seek(&id);
        Ok(())
    }

    fn navigate(&mut self, which: Collection, forward: bool) -> RoiResult<Option<RoiId>> {
        let list = self.list_mut(which);
        let step = if forward { list.next() } else { list.prev() };
        let id = match step {
            Ok(&id) => id,
            Err(RoiError::Empty) => return Ok(None),
            Err(err) => return Err(err),
        };
        self.set_active(Some(id))?;
        Ok(Some(id))
    }

    pub fn next_branch(&mut self) -> RoiResult<Option<RoiId>> {
        self.navigate(Collection::Branches, true)
    }

    pub fn previous_branch(&mut self) -> RoiResult<Option<RoiId>> {
        self.navigate(Collection::Branches, false)
    }

    pub fn next_polygon(&mut self) -> RoiResult<Option<RoiId>> {
        self.navigate(Collection::Polygons, true)
    }

    pub fn previous_polygon(&mut self) -> RoiResult<Option<RoiId>> {
        self.navigate(Collection::Polygons, false)
    }

    pub fn next_pixel_roi(&mut self) -> RoiResult<Option<RoiId>> {
        self.navigate(Collection::Pixels, true)
    }

    pub fn previous_pixel_roi(&mut self) -> RoiResult<Option<RoiId>> {
        self.navigate(Collection::Pixels, false)
    }

    /// Step through the segments of the active branch, wrapping around. With
    /// the branch itself active, `next` picks the first segment and
    /// `previous` the last.
    fn step_segment(&mut self, forward: bool) -> RoiResult<Option<RoiId>> {
        let current = self.selection.current();
        let Some(branch) = current.branch() else {
            return Ok(None);
        };
        let children = self.arena.branch(branch)?.children();
        let n = children.len();
        if n == 0 {
            return Ok(None);
        }
        let target = match current.segment() {
            Some(seg) => {
                let i = self.arena.segment(seg)?.index();
                if forward {
                    (i + 1) % n
                } else {
                    (i + n - 1) % n
                }
            }
            None if forward => 0,
            None => n - 1,
        };
        let id = children[target];
        self.set_active(Some(id))?;
        Ok(Some(id))
    }

    pub fn next_segment(&mut self) -> RoiResult<Option<RoiId>> {
        self.step_segment(true)
    }

    pub fn previous_segment(&mut self) -> RoiResult<Option<RoiId>> {
        self.step_segment(false)
    }

    // --- Mask and frame ---------------------------------------------------------

    /// Regenerate the mask and drop every mask-dependent trace.
    pub fn set_threshold(&mut self, threshold: f64) {
        let _batch = self.render.batch();
        self.masks.set_threshold(threshold);
        let dropped = self.cache.invalidate_mask_dependent();
        debug!("Session::set_threshold {threshold:.4} invalidated={dropped}");
    }

    /// Install a previously computed mask as-is.
    pub(crate) fn restore_mask(&mut self, mask: Mask) -> RoiResult<()> {
        if mask.w != self.stack.w || mask.h != self.stack.h || mask.data.len() != mask.w * mask.h {
            return Err(RoiError::ShapeMismatch {
                expected: vec![self.stack.h, self.stack.w],
                actual: vec![mask.h, mask.w],
            });
        }
        let _batch = self.render.batch();
        self.masks.restore(mask);
        self.cache.invalidate_mask_dependent();
        Ok(())
    }

    pub fn set_active_frame(&mut self, frame: usize) -> RoiResult<()> {
        if frame >= self.stack.frames {
            return Err(RoiError::OutOfRange {
                what: "frame",
                index: frame,
                len: self.stack.frames,
            });
        }
        let _batch = self.render.batch();
        self.active_frame = frame;
        Ok(())
    }

    /// Change post-processing. Cached raw traces stay valid.
    pub fn set_postprocess(&mut self, postprocess: PostProcess) {
        self.postprocess = postprocess;
        self.render.request_redraw();
    }

    // --- Tree edits -----------------------------------------------------------

    fn after_edit(&mut self, outcome: &EditOutcome) {
        for &old in &outcome.removed {
            self.selection.forget(&mut self.arena, old);
            self.holds.release_roi(old);
        }
    }

    /// Split a branch into segments of path length `length`. If the branch
    /// was active, its first segment becomes active.
    pub fn split_branch(&mut self, branch: RoiId, length: f64) -> RoiResult<Vec<RoiId>> {
        let _batch = self.render.batch();
        let was_active = self.arena.branch(branch)?.is_active();
        let outcome = edit::split_branch(&mut self.arena, &mut self.cache, branch, length)?;
        self.after_edit(&outcome);
        if was_active {
            self.set_active(outcome.created.first().copied())?;
        }
        Ok(outcome.created)
    }

    /// Split every branch. All branches are validated first, so either all
    /// are split or none is. Returns the number of segments created.
    pub fn split_branches(&mut self, length: f64) -> RoiResult<usize> {
        if !(length.is_finite() && length > 0.0) {
            return Err(RoiError::InvalidArgument(format!(
                "split length must be positive, got {length}"
            )));
        }
        let ids: Vec<RoiId> = self.branches.iter().copied().collect();
        for &id in &ids {
            let total = self.arena.branch(id)?.path.length();
            if total <= 0.0 {
                return Err(RoiError::DegenerateGeometry(id));
            }
            if edit::segment_count(total, length).is_none() {
                return Err(RoiError::InvalidArgument(format!(
                    "split length {length} yields more than {} segments",
                    edit::MAX_SEGMENTS
                )));
            }
        }
        let _batch = self.render.batch();
        let mut created = 0;
        for id in ids {
            created += self.split_branch(id, length)?.len();
        }
        Ok(created)
    }

    /// Cut a segment into `parts` equal pieces. If its branch was active, the
    /// first piece becomes active.
    pub fn split_segment(&mut self, segment: RoiId, parts: usize) -> RoiResult<Vec<RoiId>> {
        let _batch = self.render.batch();
        let parent = self.arena.segment(segment)?.parent();
        let parent_active = self.arena.branch(parent)?.is_active();
        let outcome = edit::split_segment(&mut self.arena, &mut self.cache, segment, parts)?;
        self.after_edit(&outcome);
        if parent_active && !outcome.removed.is_empty() {
            self.set_active(outcome.created.first().copied())?;
        }
        Ok(outcome.created)
    }

    /// Merge a segment with its neighbour. If their branch was active, the
    /// merged segment becomes active.
    pub fn join_segments(&mut self, segment: RoiId, direction: JoinDirection) -> RoiResult<RoiId> {
        let _batch = self.render.batch();
        let parent = self.arena.segment(segment)?.parent();
        let parent_active = self.arena.branch(parent)?.is_active();
        let outcome = edit::join_segments(&mut self.arena, &mut self.cache, segment, direction)?;
        self.after_edit(&outcome);
        let joined = outcome.created[0];
        if parent_active {
            self.set_active(Some(joined))?;
        }
        Ok(joined)
    }

    /// Install segments from stored paths, replacing existing children. The
    /// paths must cover the branch path in order.
    pub(crate) fn restore_segments(&mut self, branch: RoiId, paths: Vec<Path>) -> RoiResult<Vec<RoiId>> {
        let _batch = self.render.batch();
        if !self.arena.branch(branch)?.path.is_partitioned_by(&paths, 1e-6) {
            return Err(RoiError::Format(format!(
                "segments of branch {branch:?} do not cover its path"
            )));
        }
        let outcome = edit::replace_children(&mut self.arena, &mut self.cache, branch, paths)?;
        self.after_edit(&outcome);
        Ok(outcome.created)
    }

    pub fn set_polygon_outline(&mut self, id: RoiId, outline: Vec<[f64; 2]>) -> RoiResult<()> {
        let _batch = self.render.batch();
        self.arena.polygon_mut(id)?.outline = outline;
        self.cache.invalidate(id);
        Ok(())
    }

    pub fn set_pixels(&mut self, id: RoiId, pixels: impl IntoIterator<Item = (i64, i64)>) -> RoiResult<()> {
        let _batch = self.render.batch();
        self.arena.pixel_roi_mut(id)?.pixels = pixels.into_iter().collect();
        self.cache.invalidate(id);
        Ok(())
    }

    // --- Traces ---------------------------------------------------------------

    /// Cached raw trace of `id`. Branch and segment pixels are restricted to
    /// the mask foreground.
    pub fn trace(&mut self, id: RoiId) -> RoiResult<Trace> {
        let roi = self.arena.get(id)?;
        let masked = roi.kind().is_mask_dependent();
        let stack = &self.stack;
        let mask = self.masks.mask();
        Ok(self.cache.get_or_compute(id, masked, || {
            let pixels = roi.pixels(stack.w, stack.h);
            if masked {
                mean_trace(stack, pixels.into_iter().filter(|&(x, y)| mask.get(x, y)))
            } else {
                mean_trace(stack, pixels)
            }
        }))
    }

    /// Trace after the session's post-processing.
    pub fn postprocessed_trace(&mut self, id: RoiId) -> RoiResult<Vec<f64>> {
        let raw = self.trace(id)?;
        self.postprocess.apply(&raw)
    }

    /// Traces of a branch's segments in order; empty for unsplit branches.
    pub fn linescan(&mut self, branch: RoiId) -> RoiResult<Vec<Trace>> {
        let children = self.arena.branch(branch)?.children().to_vec();
        children.into_iter().map(|c| self.trace(c)).collect()
    }

    pub fn kind(&self, id: RoiId) -> RoiResult<RoiKind> {
        Ok(self.arena.get(id)?.kind())
    }

    // --- Hold slots -------------------------------------------------------------

    /// Pin the current trace of `id` into `slot`.
    pub fn hold(&mut self, id: RoiId, slot: usize) -> RoiResult<()> {
        let trace = self.trace(id)?;
        let _batch = self.render.batch();
        if let Some(prev) = self.holds.hold(slot, id, trace)? {
            debug!("Session::hold slot {slot}: {:?} -> {id:?}", prev.roi);
        }
        Ok(())
    }

    pub fn release(&mut self, slot: usize) -> RoiResult<Option<HeldTrace>> {
        let _batch = self.render.batch();
        self.holds.release(slot)
    }

    /// Hold the active ROI in `slot`, or release it if the slot already holds
    /// it. Returns whether the slot holds the active ROI afterwards.
    pub fn toggle_hold(&mut self, slot: usize) -> RoiResult<bool> {
        let Some(active) = self.active_roi() else {
            return Ok(false);
        };
        let held_here = self.holds.get(slot)?.is_some_and(|h| h.roi == active);
        if held_here {
            self.release(slot)?;
            Ok(false)
        } else {
            self.hold(active, slot)?;
            Ok(true)
        }
    }

    pub fn held(&self, slot: usize) -> RoiResult<Option<&HeldTrace>> {
        self.holds.get(slot)
    }

    pub fn hold_slots(&self) -> &HoldSlots {
        &self.holds
    }
}
